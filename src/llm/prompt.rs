use std::fmt::Write as _;

use crate::agent_engine::history::HistoryEntry;

/// Build the per-step instruction sent alongside the screenshot.
///
/// Width and height come from the frame being sent, so coordinates are
/// grounded in the current screen rather than an assumed resolution.
pub fn build_decision_prompt(
    task: &str,
    width: u32,
    height: u32,
    history: &[HistoryEntry],
    app_names: &[String],
) -> String {
    // u64 so oversized frame headers cannot overflow the multiplication
    let cx = width / 2;
    let swipe_from = u64::from(height) * 7 / 10;
    let swipe_to = u64::from(height) * 3 / 10;

    let mut prompt = format!(
        "\
You are a phone automation assistant controlling an Android device to complete the user's task.

[Task] {task}

[Screen]
- Resolution: {width} x {height} pixels
- Coordinates: (0,0) is the top-left corner, ({width},{height}) the bottom-right

[Rules]
1. Look carefully at every icon, button, text and input field on the screen.
2. Tap coordinates must be the exact centre of the target element.
3. Text input only works after an input field has been tapped and focused.
4. If the screen already shows the task goal, reply with done.
5. If the task cannot be completed, reply with failed.

[Actions]
- tap: tap a point. params: {{\"x\": int, \"y\": int}}
- swipe: swipe from (x1,y1) to (x2,y2). params: {{\"x1\": int, \"y1\": int, \"x2\": int, \"y2\": int}}
- input: type into the focused field. params: {{\"text\": string}}
- launch: open an app by name. params: {{\"app\": string}}
- back: press the back key. params: {{}}
- home: go to the home screen. params: {{}}
- wait: do nothing this step (screen still loading). params: {{}}
- done: the task is complete. params: {{}}
- failed: the task cannot be completed. params: {{}}
"
    );

    if !app_names.is_empty() {
        let _ = writeln!(prompt, "\n[Known apps for launch]\n{}", app_names.join(", "));
    }

    if !history.is_empty() {
        prompt.push_str("\n[Recent actions, oldest first]\n");
        for entry in history {
            let _ = writeln!(prompt, "- step {}: {}: {}", entry.step, entry.action_summary, entry.rationale);
        }
        prompt.push_str(
            "Do not repeat an action that did not change the screen; try something different.\n",
        );
    }

    let _ = write!(
        prompt,
        "
[Reply format] JSON only, no extra text:
{{\"action\": \"<action>\", \"params\": {{...}}, \"thought\": \"<your reasoning>\"}}

[Examples]
{{\"action\": \"tap\", \"params\": {{\"x\": {cx}, \"y\": {cy}}}, \"thought\": \"tap the search box\"}}
{{\"action\": \"swipe\", \"params\": {{\"x1\": {cx}, \"y1\": {swipe_from}, \"x2\": {cx}, \"y2\": {swipe_to}}}, \"thought\": \"scroll up\"}}
{{\"action\": \"input\", \"params\": {{\"text\": \"bluetooth earbuds\"}}, \"thought\": \"enter the query\"}}
{{\"action\": \"done\", \"params\": {{}}, \"thought\": \"search results are shown\"}}

Analyse the screenshot and reply with the next action:",
        cy = height / 2,
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grounds_coordinates_in_current_frame() {
        let prompt = build_decision_prompt("open settings", 1080, 2400, &[], &[]);
        assert!(prompt.contains("[Task] open settings"));
        assert!(prompt.contains("1080 x 2400"));
        assert!(prompt.contains("(1080,2400)"));
        assert!(prompt.contains("\"x\": 540, \"y\": 1200"));
        assert!(!prompt.contains("[Recent actions"));
        assert!(!prompt.contains("[Known apps"));
    }

    #[test]
    fn lists_history_and_apps() {
        let history = vec![
            HistoryEntry::new(1, "home", "start from launcher"),
            HistoryEntry::new(2, "tap(10, 20)", "open drawer"),
        ];
        let apps = vec!["Settings".to_string(), "Chrome".to_string()];
        let prompt = build_decision_prompt("t", 100, 200, &history, &apps);
        assert!(prompt.contains("- step 1: home: start from launcher"));
        assert!(prompt.contains("- step 2: tap(10, 20): open drawer"));
        assert!(prompt.contains("Settings, Chrome"));
        assert!(prompt.contains("Do not repeat"));
    }

    #[test]
    fn huge_dimensions_do_not_overflow() {
        let prompt = build_decision_prompt("t", u32::MAX, u32::MAX, &[], &[]);
        assert!(prompt.contains(&format!("{} x {}", u32::MAX, u32::MAX)));
        assert!(prompt.contains("\"y1\": 3006477106"));
        assert!(prompt.contains("\"y2\": 1288490188"));

        let prompt = build_decision_prompt("t", 1080, 2400, &[], &[]);
        assert!(prompt.contains("\"y1\": 1680, \"x2\": 540, \"y2\": 720"));
    }
}
