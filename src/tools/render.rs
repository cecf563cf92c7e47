//! Text rendering for tool results.

use itertools::Itertools;

use crate::library::{ContentFormat, Idea, StoreError};
use crate::model::{
    ApiReceipt, OutboundStats, SendReceipt, StatsQuery, TemplateList, TemplatePushResult,
    TemplateRecord, TemplateRef,
};

pub fn email_sent(receipt: &SendReceipt, to: &str, subject: &str) -> String {
    format!(
        "Email sent successfully!\nMessageID: {}\nTo: {}\nSubject: {}",
        receipt.message_id, to, subject
    )
}

pub fn template_email_sent(receipt: &SendReceipt, to: &str, template: &TemplateRef) -> String {
    format!(
        "Template email sent successfully!\nMessageID: {}\nTo: {}\nTemplate: {}",
        receipt.message_id, to, template
    )
}

pub fn templates(list: &TemplateList) -> String {
    if list.templates.is_empty() {
        return "No templates found on this server.".to_string();
    }

    let entries = list
        .templates
        .iter()
        .map(|t| {
            format!(
                "• {}\n  - ID: {}\n  - Alias: {}\n  - Subject: {}",
                t.name,
                t.template_id,
                t.alias.as_deref().unwrap_or("none"),
                t.subject.as_deref().unwrap_or("none"),
            )
        })
        .join("\n\n");

    format!("Found {} templates:\n\n{}", list.templates.len(), entries)
}

pub fn delivery_stats(stats: &OutboundStats, query: &StatsQuery) -> String {
    let mut lines = vec!["Email Statistics Summary".to_string(), String::new()];

    match (query.from_date, query.to_date) {
        (Some(from), Some(to)) => lines.push(format!("Period: {} to {}", from, to)),
        (Some(from), None) => lines.push(format!("Period: from {}", from)),
        (None, Some(to)) => lines.push(format!("Period: until {}", to)),
        (None, None) => {}
    }
    if let Some(tag) = &query.tag {
        lines.push(format!("Tag: {}", tag));
    }

    lines.push(format!("Sent: {} emails", stats.sent));
    lines.push(format!(
        "Open Rate: {:.1}% ({}/{} tracked emails)",
        stats.open_rate(),
        stats.unique_opens,
        stats.tracked
    ));
    lines.push(format!(
        "Click Rate: {:.1}% ({}/{} tracked links)",
        stats.click_rate(),
        stats.unique_links_clicked,
        stats.total_tracked_links_sent
    ));

    lines.join("\n")
}

pub fn categories(names: &[String]) -> String {
    if names.is_empty() {
        return "No template categories found in the template library.".to_string();
    }
    format!(
        "Template categories:\n{}",
        names.iter().map(|n| format!("- {}", n)).join("\n")
    )
}

pub fn category_templates(category: &str, names: &[String]) -> String {
    if names.is_empty() {
        return format!("No templates found in category '{}'.", category);
    }
    format!(
        "Templates in '{}':\n{}",
        category,
        names.iter().map(|n| format!("- {}", n)).join("\n")
    )
}

pub fn template_content(format: ContentFormat, content: &str) -> String {
    format!("```{}\n{}\n```", format.as_str(), content)
}

pub fn ideas(topic: &str, ideas: &[Idea]) -> String {
    if ideas.is_empty() {
        return format!("No templates found matching \"{}\".", topic);
    }
    format!(
        "Template ideas matching \"{}\":\n{}",
        topic,
        ideas
            .iter()
            .map(|i| format!("• {} ({})", i.template, i.category))
            .join("\n")
    )
}

/// A handled library failure, phrased for the caller.
pub fn store_failure(action: &str, err: &StoreError) -> String {
    format!("Unable to {}: {} ({})", action, err.message, err.code)
}

pub fn template_created(record: &TemplateRecord, subject: &str) -> String {
    format!(
        "Template created successfully!\nID: {}\nName: {}\nSubject: {}\nAlias: {}\nActive: {}",
        record.template_id,
        record.name,
        record.subject.as_deref().unwrap_or(subject),
        record.alias.as_deref().unwrap_or("none"),
        record.active
    )
}

pub fn template_updated(record: &TemplateRecord, updated_fields: &[&str]) -> String {
    let mut out = format!(
        "Template updated successfully!\nID: {}\nName: {}\nAlias: {}\nActive: {}",
        record.template_id,
        record.name,
        record.alias.as_deref().unwrap_or("none"),
        record.active
    );
    if !updated_fields.is_empty() {
        out.push_str(&format!("\nUpdated fields: {}", updated_fields.join(", ")));
    }
    out
}

pub fn template_deleted(id_or_alias: &str, receipt: &ApiReceipt) -> String {
    let status = if receipt.message.is_empty() {
        "Deleted"
    } else {
        receipt.message.as_str()
    };
    format!(
        "Template deleted successfully!\nTemplate: {}\nStatus: {}",
        id_or_alias, status
    )
}

/// Shared rendering for simulated and applied pushes; only the framing differs.
pub fn template_push(
    result: &TemplatePushResult,
    source: u64,
    destination: u64,
    perform_changes: bool,
) -> String {
    let (heading, affected, none) = if perform_changes {
        (
            "Template push applied",
            "templates were affected",
            "No templates were affected.",
        )
    } else {
        (
            "Template push simulation (no changes made)",
            "templates would be affected",
            "No templates would be affected.",
        )
    };

    let mut out = format!(
        "{} from server {} to server {}\nPerformChanges: {}\n\n",
        heading, source, destination, perform_changes
    );

    if result.templates.is_empty() {
        out.push_str(none);
        return out;
    }

    out.push_str(&format!("{} {}:\n", result.total_count, affected));
    out.push_str(
        &result
            .templates
            .iter()
            .map(|t| {
                format!(
                    "• {}: {} (ID: {}, Alias: {})",
                    t.action,
                    t.name,
                    t.template_id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "none".to_string()),
                    t.alias.as_deref().unwrap_or("none"),
                )
            })
            .join("\n"),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::ErrorCode;
    use crate::model::{PushedTemplate, TemplateSummary};

    #[test]
    fn test_stats_rendering() {
        let stats = OutboundStats {
            sent: 10,
            tracked: 8,
            unique_opens: 4,
            total_tracked_links_sent: 6,
            unique_links_clicked: 3,
            ..Default::default()
        };
        let text = delivery_stats(&stats, &StatsQuery::default());
        assert!(text.contains("Sent: 10 emails"));
        assert!(text.contains("Open Rate: 50.0%"));
        assert!(text.contains("Click Rate: 50.0%"));

        let text = delivery_stats(&OutboundStats::default(), &StatsQuery::default());
        assert!(text.contains("Open Rate: 0.0%"));
        assert!(text.contains("Click Rate: 0.0%"));
    }

    #[test]
    fn test_templates_rendering() {
        let list = TemplateList {
            total_count: 1,
            templates: vec![TemplateSummary {
                template_id: 42,
                name: "Welcome".to_string(),
                alias: Some("welcome".to_string()),
                subject: None,
                active: true,
                template_type: None,
            }],
        };
        let text = templates(&list);
        assert!(text.starts_with("Found 1 templates:"));
        assert!(text.contains("• Welcome\n  - ID: 42\n  - Alias: welcome\n  - Subject: none"));
    }

    #[test]
    fn test_ideas_and_empty_states() {
        let found = ideas(
            "wel",
            &[Idea {
                category: "basic".to_string(),
                template: "welcome".to_string(),
            }],
        );
        assert!(found.contains("• welcome (basic)"));
        assert_eq!(ideas("zzz", &[]), "No templates found matching \"zzz\".");
        assert_eq!(
            category_templates("basic", &[]),
            "No templates found in category 'basic'."
        );
    }

    #[test]
    fn test_store_failure_rendering() {
        let err = StoreError::new(ErrorCode::NotDir, "Not a directory: category 'basic'");
        assert_eq!(
            store_failure("list template categories", &err),
            "Unable to list template categories: Not a directory: category 'basic' (NOT_DIR)"
        );
    }

    #[test]
    fn test_push_framing_only_differs() {
        let result = TemplatePushResult {
            total_count: 1,
            templates: vec![PushedTemplate {
                action: "Create".to_string(),
                template_id: None,
                alias: Some("welcome".to_string()),
                name: "Welcome".to_string(),
                template_type: Some("Standard".to_string()),
            }],
        };
        let simulated = template_push(&result, 1, 2, false);
        let applied = template_push(&result, 1, 2, true);

        let list = "• Create: Welcome (ID: none, Alias: welcome)";
        assert!(simulated.ends_with(list));
        assert!(applied.ends_with(list));
        assert!(simulated.contains("simulation"));
        assert!(applied.contains("applied"));
    }
}
