use opsblade_types::{TaskInfo, TaskResult};

/// Receives start and stop notifications while a workflow runs.
///
/// Returning `false` from either callback ends the run after the current
/// instruction.
pub trait RunObserver {
    fn on_start(&mut self, info: &TaskInfo) -> bool;
    fn on_stop(&mut self, result: &TaskResult) -> bool;
}

/// Default observer printing each notification to stdout followed by a blank line.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleObserver {
    json: bool,
}

impl ConsoleObserver {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn start_text(&self, info: &TaskInfo) -> String {
        if self.json { info.serialize_pretty() } else { info.to_string() }
    }

    fn stop_text(&self, result: &TaskResult) -> String {
        if self.json { result.serialize_pretty() } else { result.to_string() }
    }
}

impl RunObserver for ConsoleObserver {
    fn on_start(&mut self, info: &TaskInfo) -> bool {
        println!("{}\n", self.start_text(info));
        true
    }

    fn on_stop(&mut self, result: &TaskResult) -> bool {
        println!("{}\n", self.stop_text(result));
        result.success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsblade_types::{Document, MessageKind};

    fn result(success: bool) -> TaskResult {
        TaskResult {
            success,
            msg: "Slept for 1 seconds".into(),
            sequence: 2,
            task: "sleep".into(),
            ..TaskResult::default()
        }
    }

    #[test]
    fn stop_verdict_follows_task_success() {
        let mut console = ConsoleObserver::new(false);
        assert!(console.on_stop(&result(true)));
        assert!(!console.on_stop(&result(false)));

        let info = TaskInfo {
            message_type: MessageKind::TaskStart,
            sequence: 1,
            task: "sleep".into(),
            ..TaskInfo::default()
        };
        assert!(console.on_start(&info));
    }

    #[test]
    fn human_mode_prints_display_form() {
        let console = ConsoleObserver::new(false);
        let text = console.stop_text(&result(true));
        assert!(text.starts_with("* Completed task 2: [sleep]\nSuccess: true\n"));
        assert!(serde_json::from_str::<Document>(&text).is_err());
    }

    #[test]
    fn json_mode_prints_pretty_json() {
        let console = ConsoleObserver::new(true);
        let text = console.stop_text(&result(false));
        assert!(text.contains('\n'));
        let value: Document = serde_json::from_str(&text).expect("json notification");
        assert_eq!(value["message_type"], "task_stop");
        assert_eq!(value["success"], false);
        assert_eq!(value["sequence"], 2);

        let info = TaskInfo {
            message_type: MessageKind::TaskStart,
            sequence: 1,
            task: "sleep".into(),
            ..TaskInfo::default()
        };
        let value: Document = serde_json::from_str(&console.start_text(&info)).expect("json notification");
        assert_eq!(value["message_type"], "task_start");
        assert_eq!(value["task"], "sleep");
    }
}
