//! Request/response channel between the UI layer and core services.
//!
//! # Responsibility
//! - Map a method name plus positional JSON arguments to one service call.
//! - Serialize results and classify failures into stable error codes.
//!
//! # Invariants
//! - Arguments are a JSON array (or `null` for none).
//! - Storage and internal failures are logged with detail and surfaced with a
//!   generic message only.
//! - Dispatch never panics on caller input.

use crate::app::AppContext;
use crate::model::profile::{NewProfile, ProfilePatch};
use crate::model::task::{NewTask, TaskPatch, TaskStatus};
use crate::repo::RepoError;
use crate::service::dashboard::{compute_dashboard, DashboardError, DashboardRequest};
use crate::service::ServiceError;
use log::{debug, error};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Every method the channel answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpcMethod {
    GetProfiles,
    GetProfile,
    CreateProfile,
    UpdateProfile,
    DeleteProfile,
    VerifyProfilePassword,
    GetTasks,
    GetTask,
    GetTasksInRange,
    CreateTask,
    UpdateTask,
    SetTaskStatus,
    DeleteTask,
    GetUnreadNotifications,
    GetAllNotifications,
    MarkNotificationRead,
    MarkAllNotificationsRead,
    CreateReminder,
    GetDashboard,
    ExportData,
}

impl IpcMethod {
    pub const ALL: [Self; 20] = [
        Self::GetProfiles,
        Self::GetProfile,
        Self::CreateProfile,
        Self::UpdateProfile,
        Self::DeleteProfile,
        Self::VerifyProfilePassword,
        Self::GetTasks,
        Self::GetTask,
        Self::GetTasksInRange,
        Self::CreateTask,
        Self::UpdateTask,
        Self::SetTaskStatus,
        Self::DeleteTask,
        Self::GetUnreadNotifications,
        Self::GetAllNotifications,
        Self::MarkNotificationRead,
        Self::MarkAllNotificationsRead,
        Self::CreateReminder,
        Self::GetDashboard,
        Self::ExportData,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GetProfiles => "get-profiles",
            Self::GetProfile => "get-profile",
            Self::CreateProfile => "create-profile",
            Self::UpdateProfile => "update-profile",
            Self::DeleteProfile => "delete-profile",
            Self::VerifyProfilePassword => "verify-profile-password",
            Self::GetTasks => "get-tasks",
            Self::GetTask => "get-task",
            Self::GetTasksInRange => "get-tasks-in-range",
            Self::CreateTask => "create-task",
            Self::UpdateTask => "update-task",
            Self::SetTaskStatus => "set-task-status",
            Self::DeleteTask => "delete-task",
            Self::GetUnreadNotifications => "get-unread-notifications",
            Self::GetAllNotifications => "get-all-notifications",
            Self::MarkNotificationRead => "mark-notification-read",
            Self::MarkAllNotificationsRead => "mark-all-notifications-read",
            Self::CreateReminder => "create-reminder",
            Self::GetDashboard => "get-dashboard",
            Self::ExportData => "export-data",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IpcErrorCode {
    UnknownMethod,
    InvalidArgs,
    Validation,
    NotFound,
    Storage,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpcError {
    pub code: IpcErrorCode,
    pub message: String,
}

impl IpcError {
    pub fn new(code: IpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn invalid_args(message: impl Into<String>) -> Self {
        Self::new(IpcErrorCode::InvalidArgs, message)
    }
}

impl Display for IpcError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl Error for IpcError {}

impl From<ServiceError> for IpcError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::Validation(err) => Self::new(IpcErrorCode::Validation, err.to_string()),
            ServiceError::NotFound { entity, id } => {
                Self::new(IpcErrorCode::NotFound, format!("{entity} not found: {id}"))
            }
            ServiceError::Repo(err) => {
                error!("event=ipc_call module=ipc status=error error_code=storage error={err}");
                Self::new(IpcErrorCode::Storage, "storage failure; see logs for details")
            }
            other => {
                error!("event=ipc_call module=ipc status=error error_code=internal error={other}");
                Self::new(IpcErrorCode::Internal, "internal failure; see logs for details")
            }
        }
    }
}

impl From<RepoError> for IpcError {
    fn from(value: RepoError) -> Self {
        ServiceError::from(value).into()
    }
}

impl From<DashboardError> for IpcError {
    fn from(value: DashboardError) -> Self {
        Self::invalid_args(value.to_string())
    }
}

/// Wire envelope returned by [`invoke_json`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IpcResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<IpcError>,
}

impl From<Result<Value, IpcError>> for IpcResponse {
    fn from(value: Result<Value, IpcError>) -> Self {
        match value {
            Ok(data) => Self {
                ok: true,
                data: Some(data),
                error: None,
            },
            Err(error) => Self {
                ok: false,
                data: None,
                error: Some(error),
            },
        }
    }
}

/// String-in/string-out form of [`dispatch`] for bridge layers.
pub fn invoke_json(ctx: &AppContext, method: &str, args_json: &str) -> String {
    let result = if args_json.trim().is_empty() {
        dispatch(ctx, method, Value::Null)
    } else {
        serde_json::from_str::<Value>(args_json)
            .map_err(|err| IpcError::invalid_args(format!("arguments are not valid JSON: {err}")))
            .and_then(|args| dispatch(ctx, method, args))
    };
    let response = IpcResponse::from(result);
    serde_json::to_string(&response).unwrap_or_else(|err| {
        format!(
            r#"{{"ok":false,"error":{{"code":"internal","message":"response encoding failed: {}"}}}}"#,
            err.to_string().replace('"', "'")
        )
    })
}

/// Routes one channel call.
pub fn dispatch(ctx: &AppContext, method: &str, args: Value) -> Result<Value, IpcError> {
    let method = IpcMethod::parse(method).ok_or_else(|| {
        IpcError::new(
            IpcErrorCode::UnknownMethod,
            format!("unknown method `{method}`"),
        )
    })?;
    let args = Args::new(args)?;
    debug!(
        "event=ipc_call module=ipc status=start method={} argc={}",
        method.as_str(),
        args.values.len()
    );

    match method {
        IpcMethod::GetProfiles => to_value(ctx.profiles()?.list_profiles()?),
        IpcMethod::GetProfile => to_value(ctx.profiles()?.get_profile(args.required(0, "id")?)?),
        IpcMethod::CreateProfile => {
            let input: NewProfile = args.required(0, "profile")?;
            to_value(ctx.profiles()?.create_profile(input)?)
        }
        IpcMethod::UpdateProfile => {
            let id: Uuid = args.required(0, "id")?;
            let patch: ProfilePatch = args.required(1, "profile")?;
            to_value(ctx.profiles()?.update_profile(id, patch)?)
        }
        IpcMethod::DeleteProfile => {
            to_value(ctx.profiles()?.delete_profile(args.required(0, "id")?)?)
        }
        IpcMethod::VerifyProfilePassword => {
            let id: Uuid = args.required(0, "id")?;
            let password: String = args.required(1, "password")?;
            to_value(ctx.profiles()?.verify_password(id, &password)?)
        }
        IpcMethod::GetTasks => to_value(ctx.tasks()?.list_tasks(args.required(0, "profileId")?)?),
        IpcMethod::GetTask => to_value(ctx.tasks()?.get_task(args.required(0, "id")?)?),
        IpcMethod::GetTasksInRange => {
            let profile_id: Uuid = args.required(0, "profileId")?;
            let from: i64 = args.required(1, "from")?;
            let to: i64 = args.required(2, "to")?;
            to_value(ctx.tasks()?.list_tasks_in_range(profile_id, from, to)?)
        }
        IpcMethod::CreateTask => {
            let input: NewTask = args.required(0, "task")?;
            to_value(ctx.tasks()?.create_task(input)?)
        }
        IpcMethod::UpdateTask => {
            let patch: TaskPatch = args.required(0, "task")?;
            to_value(ctx.tasks()?.update_task(patch)?)
        }
        IpcMethod::SetTaskStatus => {
            let id: Uuid = args.required(0, "id")?;
            let status: TaskStatus = args.required(1, "status")?;
            to_value(ctx.tasks()?.set_status(id, status)?)
        }
        IpcMethod::DeleteTask => {
            ctx.tasks()?.delete_task(args.required(0, "id")?)?;
            Ok(Value::Null)
        }
        IpcMethod::GetUnreadNotifications => {
            to_value(ctx.notifications()?.list_unread(args.required(0, "profileId")?)?)
        }
        IpcMethod::GetAllNotifications => {
            to_value(ctx.notifications()?.list_all(args.required(0, "profileId")?)?)
        }
        IpcMethod::MarkNotificationRead => {
            ctx.notifications()?.mark_read(args.required(0, "id")?)?;
            Ok(Value::Null)
        }
        IpcMethod::MarkAllNotificationsRead => {
            to_value(ctx.notifications()?.mark_all_read(args.required(0, "profileId")?)?)
        }
        IpcMethod::CreateReminder => {
            let task_id: Uuid = args.required(0, "taskId")?;
            let date: i64 = args.required(1, "date")?;
            let message: Option<String> = args.optional(2, "message")?;
            to_value(
                ctx.tasks()?
                    .create_reminder(task_id, date, message.as_deref())?,
            )
        }
        IpcMethod::GetDashboard => {
            let profile_id: Uuid = args.required(0, "profileId")?;
            let timeframe: String = args.required(1, "timeframe")?;
            let previous_total: Option<usize> = args.optional(2, "previousTotal")?;
            let tasks = ctx.tasks()?.list_tasks(profile_id)?;
            let request = DashboardRequest {
                timeframe,
                previous_total: previous_total.unwrap_or(0),
                week_start: ctx.config().week_start,
            };
            to_value(compute_dashboard(
                &tasks,
                &request,
                &ctx.clock().now_local(),
            )?)
        }
        IpcMethod::ExportData => {
            let path = ctx.exports()?.export_to_dir(&ctx.config().export_dir)?;
            to_value(path.display().to_string())
        }
    }
}

struct Args {
    values: Vec<Value>,
}

impl Args {
    fn new(raw: Value) -> Result<Self, IpcError> {
        match raw {
            Value::Null => Ok(Self { values: Vec::new() }),
            Value::Array(values) => Ok(Self { values }),
            other => Err(IpcError::invalid_args(format!(
                "arguments must be a JSON array, got {}",
                json_kind(&other)
            ))),
        }
    }

    fn required<T: DeserializeOwned>(&self, index: usize, name: &str) -> Result<T, IpcError> {
        match self.values.get(index) {
            Some(Value::Null) | None => Err(IpcError::invalid_args(format!(
                "missing argument #{index} `{name}`"
            ))),
            Some(value) => decode(value, index, name),
        }
    }

    fn optional<T: DeserializeOwned>(
        &self,
        index: usize,
        name: &str,
    ) -> Result<Option<T>, IpcError> {
        match self.values.get(index) {
            Some(Value::Null) | None => Ok(None),
            Some(value) => decode(value, index, name).map(Some),
        }
    }
}

fn decode<T: DeserializeOwned>(value: &Value, index: usize, name: &str) -> Result<T, IpcError> {
    T::deserialize(value).map_err(|err| {
        IpcError::invalid_args(format!("invalid argument #{index} `{name}`: {err}"))
    })
}

fn to_value<T: Serialize>(value: T) -> Result<Value, IpcError> {
    serde_json::to_value(value).map_err(|err| {
        error!("event=ipc_call module=ipc status=error error_code=encode_failed error={err}");
        IpcError::new(IpcErrorCode::Internal, "response encoding failed")
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::IpcMethod;

    #[test]
    fn method_names_round_trip() {
        for method in IpcMethod::ALL {
            assert_eq!(IpcMethod::parse(method.as_str()), Some(method));
        }
        assert_eq!(IpcMethod::parse("drop-tables"), None);
    }
}
