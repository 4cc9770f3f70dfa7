/// One name line plus the two element lines that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawElementGroup {
    pub name: Option<String>,
    pub line1: String,
    pub line2: String,
}

/// Splits catalog text into element groups. Anything that does not line up
/// as `name / 1 ... / 2 ...` (or a bare `1 ... / 2 ...` pair) is skipped.
pub fn parse_element_groups(content: &str) -> Vec<RawElementGroup> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut result = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if i + 2 < lines.len()
            && !is_line1(lines[i])
            && is_line1(lines[i + 1])
            && is_line2(lines[i + 2])
        {
            result.push(RawElementGroup {
                name: Some(lines[i].to_string()),
                line1: lines[i + 1].to_string(),
                line2: lines[i + 2].to_string(),
            });
            i += 3;
        } else if i + 1 < lines.len() && is_line1(lines[i]) && is_line2(lines[i + 1]) {
            result.push(RawElementGroup {
                name: None,
                line1: lines[i].to_string(),
                line2: lines[i + 1].to_string(),
            });
            i += 2;
        } else {
            log::debug!("skipping unaligned catalog line: {:?}", lines[i]);
            i += 1;
        }
    }

    result
}

fn is_line1(line: &str) -> bool {
    line.starts_with("1 ")
}

fn is_line2(line: &str) -> bool {
    line.starts_with("2 ")
}
