/// Pending kill of one or more sessions, at least one of them attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteConfirmDialog {
    /// Every session killed on confirm
    pub targets: Vec<String>,
    /// The attached subset, listed in the prompt
    pub attached: Vec<String>,
}

impl DeleteConfirmDialog {
    pub fn single(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            targets: vec![name.clone()],
            attached: vec![name],
        }
    }

    pub fn batch(targets: Vec<String>, attached: Vec<String>) -> Self {
        Self { targets, attached }
    }

    pub fn attached_label(&self) -> String {
        self.attached.join(", ")
    }

    /// Detached sessions that go along with the attached ones
    pub fn detached_count(&self) -> usize {
        self.targets.len().saturating_sub(self.attached.len())
    }
}
