use recall_types::SystemPrompt;
use std::sync::Arc;
use tokio::sync::watch;

/// The agent's live instructions, shared between the session (reader) and
/// background refresh cycles (writers).
///
/// Every update swaps in a complete [`SystemPrompt`], so readers only ever
/// observe a whole prompt. Concurrent writers are last-write-wins.
#[derive(Debug, Clone)]
pub struct AgentInstructions {
    tx: Arc<watch::Sender<Arc<SystemPrompt>>>,
}

impl AgentInstructions {
    pub fn new(prompt: SystemPrompt) -> Self {
        let (tx, _) = watch::channel(Arc::new(prompt));
        Self { tx: Arc::new(tx) }
    }

    /// Returns the prompt in effect right now.
    pub fn current(&self) -> Arc<SystemPrompt> {
        self.tx.borrow().clone()
    }

    /// The full instruction text for the next LLM turn.
    pub fn text(&self) -> String {
        self.current().text()
    }

    /// Replaces the whole prompt.
    pub fn replace(&self, prompt: SystemPrompt) {
        self.tx.send_replace(Arc::new(prompt));
    }

    /// Replaces the memory appendix, keeping the current base. Returns the
    /// prompt that was installed.
    pub fn replace_appendix(&self, memory_appendix: String) -> Arc<SystemPrompt> {
        let mut installed = None;
        self.tx.send_modify(|prompt| {
            let next = Arc::new(prompt.with_appendix(memory_appendix));
            installed = Some(next.clone());
            *prompt = next;
        });
        installed.unwrap_or_else(|| self.current())
    }

    /// Notifies the receiver whenever the prompt is replaced.
    pub fn subscribe(&self) -> watch::Receiver<Arc<SystemPrompt>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appendix_is_replaced_not_merged() {
        let instructions = AgentInstructions::new(SystemPrompt::new("base"));
        instructions.replace_appendix("\n\nfirst".to_string());
        instructions.replace_appendix("\n\nsecond".to_string());
        assert_eq!(instructions.text(), "base\n\nsecond");
    }

    #[test]
    fn clones_share_state() {
        let instructions = AgentInstructions::new(SystemPrompt::new("base"));
        let writer = instructions.clone();
        writer.replace_appendix("\n\nmem".to_string());
        assert!(instructions.current().has_memories());
    }

    #[tokio::test]
    async fn subscribers_see_replacements() {
        let instructions = AgentInstructions::new(SystemPrompt::new("base"));
        let mut rx = instructions.subscribe();
        instructions.replace(SystemPrompt::new("other"));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().text(), "other");
    }

    #[tokio::test]
    async fn concurrent_writers_never_expose_partial_prompts() {
        let instructions = AgentInstructions::new(SystemPrompt::new("base"));
        let mut handles = Vec::new();
        for i in 0..16 {
            let writer = instructions.clone();
            handles.push(tokio::spawn(async move {
                writer.replace_appendix(format!("\n\nmemory-{i}"));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        let text = instructions.text();
        assert!(text.starts_with("base\n\nmemory-"));
        assert_eq!(text.matches("memory-").count(), 1);
    }
}
