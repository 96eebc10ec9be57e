use std::io::ErrorKind;
use std::path::Path;

/// Removes a directory and everything under it if it exists.
pub fn delete_dir_if_exists(dir: &Path) -> Result<(), std::io::Error> {
    match fs_err::remove_dir_all(dir) {
        Ok(()) => {
            tracing::debug!("Successfully deleted directory: {}", dir.display());
        },
        Err(err) => match err.kind() {
            ErrorKind::NotFound => {
                tracing::debug!("No need to delete {} as it doesn't exist", dir.display())
            },
            errkind => {
                tracing::error!("Unable to delete {}: {:?}", dir.display(), errkind);
                return Err(err);
            },
        },
    };
    Ok(())
}
