//! Clean the public directory

use anyhow::Result;
use std::fs;

use crate::generator::list_files;
use crate::Blog;

/// Remove the generated site; returns how many files were deleted
pub fn run(blog: &Blog) -> Result<usize> {
    if !blog.public_dir.exists() {
        return Ok(0);
    }

    let count = list_files(&blog.public_dir)?.len();
    fs::remove_dir_all(&blog.public_dir)?;
    tracing::info!("Deleted: {:?} ({} files)", blog.public_dir, count);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use tempfile::TempDir;

    #[test]
    fn test_clean_removes_public_dir() {
        let dir = TempDir::new().unwrap();
        let blog = Blog {
            config: SiteConfig::default(),
            base_dir: dir.path().to_path_buf(),
            public_dir: dir.path().join("public"),
        };
        assert_eq!(run(&blog).unwrap(), 0);

        fs::create_dir_all(blog.public_dir.join("post/a")).unwrap();
        fs::write(blog.public_dir.join("index.html"), "x").unwrap();
        fs::write(blog.public_dir.join("post/a/index.html"), "y").unwrap();

        assert_eq!(run(&blog).unwrap(), 2);
        assert!(!blog.public_dir.exists());
        assert!(dir.path().exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_clean_ignores_symlink_loops() {
        let dir = TempDir::new().unwrap();
        let blog = Blog {
            config: SiteConfig::default(),
            base_dir: dir.path().to_path_buf(),
            public_dir: dir.path().join("public"),
        };
        fs::create_dir_all(blog.public_dir.join("post")).unwrap();
        fs::write(blog.public_dir.join("post/index.html"), "x").unwrap();
        std::os::unix::fs::symlink(&blog.public_dir, blog.public_dir.join("post/loop")).unwrap();

        assert_eq!(run(&blog).unwrap(), 1);
        assert!(!blog.public_dir.exists());
    }
}
