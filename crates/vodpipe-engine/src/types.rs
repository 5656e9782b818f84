//! Engine-side resource types and local job builders.
//!
//! A job is assembled in memory (task, inputs, outputs, notification
//! subscriptions) and crosses the wire exactly once on submission.

use serde::{Deserialize, Serialize};

/// Default task priority: elevated but not maximal on the engine's scale.
pub const DEFAULT_JOB_PRIORITY: i32 = 100;

/// Engine-side registration of an uploaded media file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Engine-assigned asset ID.
    pub id: String,
    /// Display title.
    pub name: String,
    /// Alternate key used to join the asset to the pipeline-side state
    /// record; carries the correlation id once tagged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternate_id: Option<String>,
}

/// Named engine-side callback subscription endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEndpoint {
    /// Engine-assigned endpoint ID.
    pub id: String,
    /// Logical name; at most one endpoint exists per name.
    pub name: String,
    /// Callback URL the engine delivers completion notifications to.
    pub endpoint_url: String,
}

/// Which job state transitions trigger a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetJobStates {
    /// Callback on every state transition.
    All,
    /// Callback only when the job reaches a terminal state.
    FinalStatesOnly,
}

/// Subscription attaching a task to a notification endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSubscription {
    pub endpoint_id: String,
    pub target_states: TargetJobStates,
}

/// Output artifact declaration on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOutput {
    /// Name of the output asset.
    pub asset_name: String,
    /// Whether the output is stored encrypted.
    pub encrypted: bool,
}

/// One unit of work within a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeTask {
    /// Named processing preset.
    pub preset: String,
    /// Numeric priority on the engine-defined scale.
    pub priority: i32,
    /// Input asset IDs.
    pub input_asset_ids: Vec<String>,
    /// Output artifact declarations.
    pub outputs: Vec<TaskOutput>,
    /// Completion callback subscriptions.
    pub notification_subscriptions: Vec<NotificationSubscription>,
}

impl EncodeTask {
    /// Create a task bound to a named preset at the given priority.
    pub fn new(preset: impl Into<String>, priority: i32) -> Self {
        Self {
            preset: preset.into(),
            priority,
            input_asset_ids: Vec::new(),
            outputs: Vec::new(),
            notification_subscriptions: Vec::new(),
        }
    }

    /// Add an input asset.
    pub fn add_input_asset(&mut self, asset: &Asset) -> &mut Self {
        self.input_asset_ids.push(asset.id.clone());
        self
    }

    /// Declare an output artifact, unencrypted.
    pub fn add_output(&mut self, asset_name: impl Into<String>) -> &mut Self {
        self.outputs.push(TaskOutput {
            asset_name: asset_name.into(),
            encrypted: false,
        });
        self
    }

    /// Subscribe the task to a notification endpoint.
    pub fn add_notification_subscription(
        &mut self,
        endpoint: &NotificationEndpoint,
        target_states: TargetJobStates,
    ) -> &mut Self {
        self.notification_subscriptions.push(NotificationSubscription {
            endpoint_id: endpoint.id.clone(),
            target_states,
        });
        self
    }
}

/// A job assembled locally and submitted once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeJob {
    /// Descriptive label.
    pub name: String,
    /// Tasks; the submission stage always builds exactly one.
    pub tasks: Vec<EncodeTask>,
}

impl EncodeJob {
    /// Create an empty job with a descriptive label.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasks: Vec::new(),
        }
    }

    /// Add a task and return a handle to keep building it.
    pub fn add_task(&mut self, task: EncodeTask) -> &mut EncodeTask {
        self.tasks.push(task);
        self.tasks.last_mut().expect("task just pushed")
    }
}

/// Acknowledgement returned when the engine accepts a job.
///
/// Acceptance, not completion: the outcome arrives later via the
/// notification endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedJob {
    /// Engine-assigned job ID.
    pub id: String,
    /// Job label as echoed back by the engine.
    pub name: String,
    /// Initial queue state reported on acceptance.
    pub state: String,
}
