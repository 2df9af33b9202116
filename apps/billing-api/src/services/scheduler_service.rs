//! Admin controls for the alert scheduler.

use std::sync::Arc;

use tracing::info;

use crate::auth::require_admin;
use crate::error::{ApiError, ApiResult};
use crate::scheduler::{CheckOutcome, SchedulerStatus};
use crate::AppState;
use billing_core::Identity;

pub struct SchedulerService {
    state: Arc<AppState>,
}

impl SchedulerService {
    pub fn new(state: Arc<AppState>) -> Self {
        SchedulerService { state }
    }

    pub async fn status(&self, caller: &Identity) -> ApiResult<SchedulerStatus> {
        require_admin(caller)?;
        Ok(self.state.scheduler.status().await)
    }

    /// Runs the daily check now, outside the schedule.
    pub async fn trigger(&self, caller: &Identity) -> ApiResult<CheckOutcome> {
        require_admin(caller)?;
        info!(user_id = %caller.user_id, "Manual receipt check requested");
        self.state.scheduler.trigger_check_now().await
    }

    pub async fn start(&self, caller: &Identity) -> ApiResult<SchedulerStatus> {
        require_admin(caller)?;
        if !self.state.scheduler.start().await {
            return Err(ApiError::Validation(
                "Scheduler needs alert recipients and at least one check day".to_string(),
            ));
        }
        Ok(self.state.scheduler.status().await)
    }

    pub async fn stop(&self, caller: &Identity) -> ApiResult<SchedulerStatus> {
        require_admin(caller)?;
        self.state.scheduler.stop().await;
        Ok(self.state.scheduler.status().await)
    }
}
