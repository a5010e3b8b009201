//! Task analysis: keywords, task type, complexity, domains and pattern hints

use super::lexicon::DOMAIN_GLOSSARY;
use super::tokenizer::Tokenizer;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Kind of work a task describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Implementation,
    Analysis,
    Testing,
    Refactor,
    Documentation,
}

/// Coarse size of a task description
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

/// Derived view of a task description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAnalysis {
    /// Unique tokens in first-seen order
    pub keywords: Vec<String>,
    pub task_type: TaskType,
    pub complexity: Complexity,
    pub domains: Vec<String>,
    pub required_patterns: Vec<String>,
}

impl TaskAnalysis {
    /// Union of keywords, domains and patterns used for matching
    pub fn match_terms(&self) -> HashSet<&str> {
        self.keywords
            .iter()
            .chain(&self.domains)
            .chain(&self.required_patterns)
            .map(String::as_str)
            .collect()
    }
}

/// Turns free-text tasks into [`TaskAnalysis`] values
#[derive(Debug, Clone, Default)]
pub struct TaskAnalyzer {
    tokenizer: Tokenizer,
}

impl TaskAnalyzer {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self { tokenizer }
    }

    pub fn analyze(&self, task: &str) -> TaskAnalysis {
        let tokens = self.tokenizer.tokenize(task);

        let mut seen = HashSet::new();
        let keywords: Vec<String> = tokens
            .iter()
            .filter(|token| seen.insert(token.as_str()))
            .cloned()
            .collect();

        TaskAnalysis {
            task_type: classify(&keywords),
            complexity: assess_complexity(tokens.len()),
            domains: extract_domains(&keywords),
            required_patterns: identify_patterns(&keywords),
            keywords,
        }
    }
}

fn classify(keywords: &[String]) -> TaskType {
    let any = |needles: &[&str]| {
        keywords
            .iter()
            .any(|keyword| needles.iter().any(|needle| keyword.contains(needle)))
    };

    if any(&["test", "validate"]) {
        TaskType::Testing
    } else if any(&["refactor"]) {
        TaskType::Refactor
    } else if any(&["doc", "write"]) {
        TaskType::Documentation
    } else if any(&["analyse", "analyze"]) {
        TaskType::Analysis
    } else {
        TaskType::Implementation
    }
}

fn assess_complexity(token_count: usize) -> Complexity {
    match token_count {
        0..=8 => Complexity::Low,
        9..=20 => Complexity::Medium,
        _ => Complexity::High,
    }
}

fn extract_domains(keywords: &[String]) -> Vec<String> {
    let mut domains: Vec<String> = Vec::new();
    for keyword in keywords {
        if let Some(domain) = DOMAIN_GLOSSARY.get(keyword.as_str()) {
            if !domains.iter().any(|d| d == domain) {
                domains.push((*domain).to_string());
            }
        }
    }
    domains
}

fn identify_patterns(keywords: &[String]) -> Vec<String> {
    let has = |word: &str| keywords.iter().any(|k| k == word);
    let mut patterns = Vec::new();

    if has("entity") {
        patterns.push("entity");
    }
    if has("value") && has("object") {
        patterns.push("value-object");
    }
    if has("event") || has("events") {
        patterns.push("domain-event");
    }
    if has("port") || has("adapter") {
        patterns.push("port-adapter");
    }
    if has("aggregate") {
        patterns.push("aggregate");
    }
    if has("use") && has("case") {
        patterns.push("use-case");
    }

    patterns.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(task: &str) -> TaskAnalysis {
        TaskAnalyzer::default().analyze(task)
    }

    #[test]
    fn test_keywords_are_unique_and_ordered() {
        let analysis = analyze("Create user entity with user validation");
        assert_eq!(analysis.keywords, vec!["user", "entity", "validation"]);
    }

    #[test]
    fn test_classification_priority() {
        assert_eq!(analyze("refactor the tests").task_type, TaskType::Testing);
        assert_eq!(analyze("refactor billing docs").task_type, TaskType::Refactor);
        assert_eq!(analyze("write onboarding guide").task_type, TaskType::Documentation);
        assert_eq!(analyze("analyze churn").task_type, TaskType::Analysis);
        assert_eq!(analyze("add checkout flow").task_type, TaskType::Implementation);
    }

    #[test]
    fn test_complexity_counts_duplicate_tokens() {
        assert_eq!(analyze("one two three").complexity, Complexity::Low);
        let nine = "alpha alpha alpha alpha alpha alpha alpha alpha alpha";
        assert_eq!(analyze(nine).complexity, Complexity::Medium);
        let long = (0..21).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        assert_eq!(analyze(&long).complexity, Complexity::High);
    }

    #[test]
    fn test_domains_use_glossary() {
        let analysis = analyze("customer payments and user accounts");
        assert_eq!(analysis.domains, vec!["user", "billing"]);
    }

    #[test]
    fn test_patterns_from_co_occurrence() {
        let analysis = analyze("value object for order use case with port");
        assert_eq!(
            analysis.required_patterns,
            vec!["value-object", "port-adapter", "use-case"]
        );
        assert!(analyze("value only").required_patterns.is_empty());
    }

    #[test]
    fn test_match_terms_union() {
        let analysis = analyze("Create user entity with domain events");
        let terms = analysis.match_terms();
        assert!(terms.contains("user"));
        assert!(terms.contains("events"));
        assert!(terms.contains("domain-event"));
        assert!(terms.contains("entity"));
    }
}
