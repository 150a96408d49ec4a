//! Reply formatter — static texts and task-list rendering.
//!
//! Pure functions only: the same input always yields the same text, and the
//! dispatcher owns every side effect.

use tally_core::model::Task;

pub const HELP: &str = "Available commands:\n\
    /cancel - cancel the current command\n\
    /registration - account registration\n\
    /add <title> - add a task\n\
    /tasks - list your open tasks\n\
    /done <title or number> - mark a task as completed\n\
    /delete <title> - delete a task";

pub const WELCOME: &str = "Welcome! Use the buttons below to manage your tasks, \
    or type /help to see the available commands.";

pub const REGISTRATION_UNAVAILABLE: &str = "Temporarily unavailable!";

pub const CANCELLED: &str = "Command cancelled!";

pub const PROMPT_ADD_TITLE: &str = "Enter a task title";
pub const PROMPT_COMPLETE_TARGET: &str = "Enter the title or number of the task to complete";
pub const PROMPT_DELETE_TITLE: &str = "Enter the title of the task to delete";

pub const TASK_COMPLETED: &str = "Task completed!";
pub const TASK_DELETED: &str = "Task deleted!";
pub const TASK_NOT_FOUND: &str = "Task not found!";
pub const EMPTY_TITLE: &str = "Task title cannot be empty.";

pub const NO_TASKS: &str = "You have no tasks, enjoy your life!";

/// Content gate texts for document/photo events.
pub const CONTENT_NOT_ACTIVE: &str =
    "Register or activate your account to upload content.";
pub const CONTENT_BUSY: &str = "Cancel the current command with /cancel to send files.";
pub const UPLOADS_UNAVAILABLE: &str = "File uploads are temporarily unavailable.";

/// Generic store-failure text. Conversation state is left untouched so the
/// user's retry re-enters the same step.
pub const SOMETHING_WENT_WRONG: &str = "Something went wrong. Please try again.";

/// Confirmation for a newly created task, echoing the title.
pub fn task_added(title: &str) -> String {
    format!("Task added: {title}")
}

/// Status label for a task line.
pub fn status_label(completed: bool) -> &'static str {
    if completed {
        "done"
    } else {
        "in progress"
    }
}

/// Render open tasks as a 1-based numbered list, one line per task.
/// An empty sequence renders the fixed no-tasks text.
pub fn render_task_list(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return NO_TASKS.to_string();
    }

    let mut out = String::from("Your tasks:\n");
    for (i, task) in tasks.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} - {}.\n",
            i + 1,
            task.title,
            status_label(task.completed)
        ));
    }
    out
}
