//! Rendering of selected sources into a single context document

use super::models::RankedSource;

/// Render selected sources as `### Source:` sections separated by blank lines
pub fn compose_context(selected: &[RankedSource]) -> String {
    selected
        .iter()
        .map(|entry| {
            let body = entry.content.trim();
            match source_metadata_line(entry) {
                Some(metadata) => format!("### Source: {}\n{}\n{}", entry.descriptor.id, metadata, body),
                None => format!("### Source: {}\n{}", entry.descriptor.id, body),
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Token-weighted mean of the selected scores
pub fn aggregate_score(selected: &[RankedSource]) -> f64 {
    let total_tokens: usize = selected.iter().map(|entry| entry.tokens).sum();
    if total_tokens == 0 {
        return 0.0;
    }

    let weighted: f64 = selected
        .iter()
        .map(|entry| entry.score * entry.tokens as f64)
        .sum();
    weighted / total_tokens as f64
}

fn source_metadata_line(entry: &RankedSource) -> Option<String> {
    let descriptor = &entry.descriptor;
    let mut fragments = Vec::new();

    if let Some(provenance) = descriptor.provenance.as_deref().filter(|p| !p.is_empty()) {
        fragments.push(format!("Provenance: {provenance}"));
    }
    if let Some(confidence) = descriptor.pattern_confidence {
        fragments.push(format!("Confidence: {:.1}%", confidence * 100.0));
    }
    if let Some(success) = descriptor.success_rate {
        fragments.push(format!("Success Rate: {:.1}%", success * 100.0));
    }
    if let Some(delta) = descriptor.performance_delta.filter(|delta| *delta > 0.0) {
        fragments.push(format!("Performance Delta: {:.1}%", delta * 100.0));
    }

    if fragments.is_empty() {
        None
    } else {
        Some(fragments.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::source::SourceDescriptor;
    use std::sync::Arc;

    fn entry(descriptor: SourceDescriptor, score: f64, tokens: usize, content: &str) -> RankedSource {
        RankedSource {
            descriptor: Arc::new(descriptor),
            score,
            tokens,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_compose_with_and_without_metadata() {
        let selected = vec![
            entry(
                SourceDescriptor::new("adr", 0.9)
                    .with_provenance("ADR-018")
                    .with_pattern_confidence(0.95)
                    .with_success_rate(0.9)
                    .with_performance_delta(0.0),
                0.8,
                3,
                " Hexagonal architecture guidance. ",
            ),
            entry(SourceDescriptor::new("plain", 0.5), 0.7, 2, "Plain body"),
        ];

        let content = compose_context(&selected);
        assert_eq!(
            content,
            "### Source: adr\nProvenance: ADR-018 | Confidence: 95.0% | Success Rate: 90.0%\nHexagonal architecture guidance.\n\n### Source: plain\nPlain body"
        );
    }

    #[test]
    fn test_compose_includes_positive_performance_delta() {
        let selected = vec![entry(
            SourceDescriptor::new("slow", 0.5).with_performance_delta(0.45),
            0.5,
            1,
            "body",
        )];
        assert!(compose_context(&selected).contains("Performance Delta: 45.0%"));
    }

    #[test]
    fn test_compose_empty_selection() {
        assert_eq!(compose_context(&[]), "");
    }

    #[test]
    fn test_aggregate_is_token_weighted() {
        let selected = vec![
            entry(SourceDescriptor::new("a", 0.5), 1.0, 3, "x"),
            entry(SourceDescriptor::new("b", 0.5), 0.5, 1, "y"),
        ];
        assert!((aggregate_score(&selected) - 0.875).abs() < 1e-9);
        assert_eq!(aggregate_score(&[]), 0.0);
    }
}
