//! Paragraph reflow for rendered pages.
//!
//! Consecutive prose lines are joined into one line per paragraph. Headings,
//! list items and fenced code pass through untouched, and runs of blank
//! lines collapse into one.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Blank,
    Text,
    List,
    Fence,
    AfterFence,
}

fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

fn is_list_item(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with("* ") || line.starts_with("- ")
}

fn separate(out: &mut Vec<String>) {
    if out.last().is_some_and(|l| !l.is_empty()) {
        out.push(String::new());
    }
}

pub fn reflow(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut state = State::Blank;

    for line in text.lines() {
        if state == State::Fence {
            out.push(line.to_string());
            if is_fence(line) {
                state = State::AfterFence;
            }
            continue;
        }

        if line.trim().is_empty() {
            if state != State::Blank {
                out.push(String::new());
                state = State::Blank;
            }
            continue;
        }

        if line.starts_with('#') {
            separate(&mut out);
            out.push(line.to_string());
            out.push(String::new());
            state = State::Blank;
        } else if is_fence(line) {
            separate(&mut out);
            out.push(line.to_string());
            state = State::Fence;
        } else if is_list_item(line) {
            if matches!(state, State::Text | State::AfterFence) {
                out.push(String::new());
            }
            out.push(line.to_string());
            state = State::List;
        } else {
            match (state, out.last_mut()) {
                (State::Text | State::List, Some(last)) => {
                    last.push(' ');
                    last.push_str(line.trim());
                }
                _ => {
                    if state == State::AfterFence {
                        out.push(String::new());
                    }
                    out.push(line.trim().to_string());
                    state = State::Text;
                }
            }
        }
    }

    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    let mut result = out.join("\n");
    result.push('\n');
    result
}
