use panscan_core::{CoreError, ExtractionRecord, RegionKind};

/// Extraction progress for one field of one image.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldState {
    #[default]
    Pending,
    Found(String),
}

impl FieldState {
    pub fn is_found(&self) -> bool {
        matches!(self, FieldState::Found(_))
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            FieldState::Pending => None,
            FieldState::Found(v) => Some(v),
        }
    }
}

/// Per-image extraction state. The first accepted value of each field wins.
#[derive(Debug, Clone, Default)]
pub struct ExtractionContext {
    pub identifier: FieldState,
    pub name: FieldState,
}

impl ExtractionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, kind: RegionKind) -> &FieldState {
        match kind {
            RegionKind::Identifier => &self.identifier,
            RegionKind::Name => &self.name,
        }
    }

    pub fn is_pending(&self, kind: RegionKind) -> bool {
        !self.state(kind).is_found()
    }

    /// Accept `value` for `kind` unless a value was already accepted.
    /// Returns whether the value was taken.
    pub fn accept(&mut self, kind: RegionKind, value: String) -> bool {
        let slot = match kind {
            RegionKind::Identifier => &mut self.identifier,
            RegionKind::Name => &mut self.name,
        };
        if slot.is_found() {
            return false;
        }
        *slot = FieldState::Found(value);
        true
    }

    pub fn is_complete(&self) -> bool {
        self.identifier.is_found() && self.name.is_found()
    }

    /// Turn the context into a record. Without an identifier there is none.
    pub fn into_record(self, source_image: &str) -> Result<Option<ExtractionRecord>, CoreError> {
        let FieldState::Found(identifier) = self.identifier else {
            return Ok(None);
        };
        let name = match self.name {
            FieldState::Found(name) => name,
            FieldState::Pending => String::new(),
        };
        ExtractionRecord::new(identifier, name, source_image).map(Some)
    }
}

/// What happened to one image of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    Extracted(ExtractionRecord),
    /// Processed fine, but no region yielded a valid identifier.
    NoIdentifier,
    /// Decoding, annotation parsing or recognition failed.
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_value_wins() {
        let mut ctx = ExtractionContext::new();
        assert!(ctx.is_pending(RegionKind::Identifier));
        assert!(ctx.accept(RegionKind::Identifier, "ABCPE1234F".into()));
        assert!(!ctx.accept(RegionKind::Identifier, "ZZZZZ0000Z".into()));
        assert_eq!(ctx.identifier.value(), Some("ABCPE1234F"));
        assert!(ctx.is_pending(RegionKind::Name));
    }

    #[test]
    fn name_alone_yields_no_record() {
        let mut ctx = ExtractionContext::new();
        ctx.accept(RegionKind::Name, "JOHN DOE".into());
        assert_eq!(ctx.into_record("a.jpg").unwrap(), None);
    }

    #[test]
    fn missing_name_becomes_empty() {
        let mut ctx = ExtractionContext::new();
        ctx.accept(RegionKind::Identifier, "ABCPE1234F".into());
        let record = ctx.into_record("a.jpg").unwrap().unwrap();
        assert_eq!(record.name(), "");
        assert_eq!(record.source_image(), "a.jpg");
    }

    #[test]
    fn complete_once_both_found() {
        let mut ctx = ExtractionContext::new();
        ctx.accept(RegionKind::Identifier, "ABCPE1234F".into());
        assert!(!ctx.is_complete());
        ctx.accept(RegionKind::Name, "RAM".into());
        assert!(ctx.is_complete());
    }
}
