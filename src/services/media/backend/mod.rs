//! Host back-ends implementing [`SessionManager`].

#[cfg(target_os = "linux")]
pub mod mpris;
#[cfg(target_os = "windows")]
pub mod windows;

use std::sync::Arc;

use tracing::instrument;

use super::host::SessionManager;
use crate::core::{AppError, Result};

/// Connect to the media subsystem of the platform this binary runs on.
///
/// # Errors
/// Returns error if the host media subsystem cannot be reached or the
/// platform has no back-end
#[instrument]
pub async fn connect() -> Result<Arc<dyn SessionManager>> {
    #[cfg(target_os = "linux")]
    {
        let manager = mpris::MprisSessionManager::connect()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;
        Ok(Arc::new(manager))
    }

    #[cfg(target_os = "windows")]
    {
        let manager = windows::SmtcSessionManager::connect()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;
        Ok(Arc::new(manager))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Err(AppError::Backend(
            "no media session back-end for this platform".to_string(),
        ))
    }
}
