//! Write generated content into the page's tagged callout block.

use serde_json::Value;
use shared::blocks::{callout_append, callout_update, Block, CalloutStyle};
use shared::content::sanitize;
use shared::markdown::{parse_runs, TextRun};
use shared::PublishOutcome;

use crate::error::{ServiceError, ServiceResult};
use crate::notion::WorkspaceApi;
use crate::retry::{retry_when, RetryPolicy};

/// First callout whose first line carries `marker`. Later duplicates are
/// reported but left alone.
pub fn find_marked_block(children: &[Value], marker: &str) -> Option<Block> {
    let mut matches = children
        .iter()
        .filter_map(Block::from_value)
        .filter(|block| block.matches_marker(marker));

    let first = matches.next()?;
    let duplicates: Vec<String> = matches.map(|b| b.id).collect();
    if !duplicates.is_empty() {
        tracing::warn!(
            "Found {} extra '{}' callouts ({}); updating {} only",
            duplicates.len(),
            marker,
            duplicates.join(", "),
            first.id
        );
    }
    Some(first)
}

pub struct Publisher<'a, W> {
    workspace: &'a W,
    policy: RetryPolicy,
}

impl<'a, W: WorkspaceApi> Publisher<'a, W> {
    pub fn new(workspace: &'a W, policy: RetryPolicy) -> Self {
        Self { workspace, policy }
    }

    /// Sanitise `content` and write it to the marked callout on `page_id`,
    /// creating the callout when none exists. The lookup and the write are
    /// retried together, so a retry after a failed create looks again first.
    pub async fn publish(
        &self,
        page_id: &str,
        style: &CalloutStyle,
        content: &str,
    ) -> ServiceResult<PublishOutcome> {
        let runs = parse_runs(&sanitize(content));
        let label = format!("Publish '{}'", style.marker);

        let outcome = retry_when(
            &self.policy,
            &label,
            || self.write_once(page_id, style, &runs),
            ServiceError::is_transient,
        )
        .await?;

        tracing::info!("Successfully {} '{}' block", outcome.as_str(), style.marker);
        Ok(outcome)
    }

    async fn write_once(
        &self,
        page_id: &str,
        style: &CalloutStyle,
        runs: &[TextRun],
    ) -> ServiceResult<PublishOutcome> {
        let children = self.workspace.list_children(page_id).await?;

        match find_marked_block(&children, &style.marker) {
            Some(block) => {
                tracing::info!("Updating existing '{}' block {}", style.marker, block.id);
                self.workspace
                    .update_block(&block.id, &callout_update(style, runs))
                    .await?;
                Ok(PublishOutcome::Updated { block_id: block.id })
            }
            None => {
                tracing::info!("No existing '{}' block found, creating one", style.marker);
                self.workspace
                    .append_children(page_id, &callout_append(style, runs))
                    .await?;
                Ok(PublishOutcome::Created)
            }
        }
    }
}
