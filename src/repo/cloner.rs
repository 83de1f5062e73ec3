//! Git repository cloning functionality.
//!
//! A `--repo` run explores a shallow clone that lives in a temporary
//! directory for exactly as long as the [`ClonedRepository`] handle.

use anyhow::{Context, Result};
use git2::{FetchOptions, Progress, RemoteCallbacks, Repository};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tempfile::TempDir;
use tracing::{debug, info};

/// A cloned checkout. Dropping it deletes the directory.
pub struct ClonedRepository {
    temp_dir: TempDir,
    /// Short id of the checked-out commit.
    pub head: Option<String>,
}

impl ClonedRepository {
    /// Root of the working tree.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }
}

/// Options for cloning a repository.
#[derive(Debug, Clone)]
pub struct CloneOptions {
    /// Branch to checkout (None for default branch).
    pub branch: Option<String>,
    /// Depth for shallow clone (None for full clone).
    pub depth: Option<i32>,
    /// Whether to show progress.
    pub show_progress: bool,
}

impl Default for CloneOptions {
    fn default() -> Self {
        Self {
            branch: None,
            depth: Some(1),
            show_progress: true,
        }
    }
}

/// Clone a repository from a URL into a fresh temporary directory.
pub fn clone_repository(url: &str, options: CloneOptions) -> Result<ClonedRepository> {
    info!("Cloning repository: {}", url);

    let temp_dir = TempDir::new().context("Failed to create temporary directory")?;
    debug!("Clone target: {}", temp_dir.path().display());

    let progress_bar = if options.show_progress {
        let pb = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} objects")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    } else {
        None
    };

    let pb_callback = progress_bar.clone();
    let mut callbacks = RemoteCallbacks::new();
    callbacks.transfer_progress(move |progress: Progress<'_>| {
        if let Some(ref pb) = pb_callback {
            pb.set_length(progress.total_objects() as u64);
            pb.set_position(progress.received_objects() as u64);
        }
        true
    });

    let mut fetch_opts = FetchOptions::new();
    fetch_opts.remote_callbacks(callbacks);
    if let Some(depth) = options.depth {
        fetch_opts.depth(depth);
    }

    let mut builder = git2::build::RepoBuilder::new();
    builder.fetch_options(fetch_opts);
    if let Some(ref branch) = options.branch {
        builder.branch(branch);
    }

    let repo = builder
        .clone(url, temp_dir.path())
        .with_context(|| format!("Failed to clone repository: {}", url))?;

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }

    let head = short_head(&repo);
    info!(
        "Cloned {} at {} into {}",
        url,
        head.as_deref().unwrap_or("unknown commit"),
        temp_dir.path().display()
    );

    Ok(ClonedRepository { temp_dir, head })
}

/// Get the current commit hash (short form).
fn short_head(repo: &Repository) -> Option<String> {
    repo.head()
        .ok()
        .and_then(|head| head.peel_to_commit().ok())
        .map(|commit| commit.id().to_string().chars().take(8).collect())
}

/// Human label for a repository URL: `owner/name` when the URL has one.
pub fn repo_label(url: &str) -> String {
    let trimmed = url.trim_end_matches('/').trim_end_matches(".git");
    let path = trimmed
        .split_once("://")
        .map(|(_, rest)| rest.split_once('/').map(|(_, p)| p).unwrap_or(""))
        .or_else(|| trimmed.split_once(':').map(|(_, p)| p))
        .unwrap_or(trimmed);

    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    match parts.as_slice() {
        [.., owner, name] => format!("{}/{}", owner, name),
        [name] => name.to_string(),
        [] => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;

    fn make_origin() -> TempDir {
        let origin = TempDir::new().unwrap();
        let repo = Repository::init(origin.path()).unwrap();
        std::fs::write(origin.path().join("A.cs"), "class Widget { void Render() {} }\n").unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new("A.cs")).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let signature = Signature::now("Test", "test@example.com").unwrap();
        repo.commit(Some("HEAD"), &signature, &signature, "initial", &tree, &[])
            .unwrap();
        origin
    }

    #[test]
    fn test_clone_local_repository() {
        let origin = make_origin();
        let url = origin.path().to_string_lossy().to_string();
        let cloned = clone_repository(
            &url,
            CloneOptions {
                depth: None,
                show_progress: false,
                ..CloneOptions::default()
            },
        )
        .unwrap();

        assert!(cloned.path().join("A.cs").is_file());
        assert_eq!(cloned.head.as_ref().map(String::len), Some(8));

        let path = cloned.path().to_path_buf();
        drop(cloned);
        assert!(!path.exists());
    }

    #[test]
    fn test_clone_failure_has_context() {
        let missing = TempDir::new().unwrap().path().join("nope");
        let err = clone_repository(
            &missing.to_string_lossy(),
            CloneOptions {
                depth: None,
                show_progress: false,
                ..CloneOptions::default()
            },
        )
        .err()
        .unwrap();
        assert!(err.to_string().starts_with("Failed to clone repository:"));
    }

    #[test]
    fn test_repo_label() {
        assert_eq!(repo_label("https://github.com/rust-lang/rust.git"), "rust-lang/rust");
        assert_eq!(repo_label("https://gitlab.com/group/sub/project"), "sub/project");
        assert_eq!(repo_label("git@github.com:rust-lang/rust"), "rust-lang/rust");
        assert_eq!(repo_label("https://example.com/"), "https://example.com/");
    }

    #[test]
    fn test_clone_options_default() {
        let opts = CloneOptions::default();
        assert!(opts.branch.is_none());
        assert_eq!(opts.depth, Some(1));
        assert!(opts.show_progress);
    }
}
