use taskboard_domain::{Analysis, Priority};

const URGENT_KEYWORDS: &[&str] = &["urgent", "critical", "asap"];
const SOFT_URGENT_KEYWORDS: &[&str] = &["important", "soon"];

/// Keyword-based priority used whenever the classifier is unavailable.
pub fn local_priority(title: &str) -> Priority {
    let title = title.to_lowercase();
    if URGENT_KEYWORDS.iter().any(|k| title.contains(k)) {
        Priority::High
    } else if SOFT_URGENT_KEYWORDS.iter().any(|k| title.contains(k)) {
        Priority::Medium
    } else {
        Priority::Low
    }
}

pub fn local_analysis(title: &str) -> Analysis {
    Analysis {
        priority: local_priority(title),
        group: None,
    }
}
