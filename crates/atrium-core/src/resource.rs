//! Named byte resources.

/// A named blob of static or loaded bytes, used for application icons and
/// other embedded assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    name: String,
    content: Vec<u8>,
}

impl Resource {
    /// Create a resource from a name and its raw content.
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// The resource name, usually the source file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw bytes of the resource.
    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_accessors() {
        let icon = Resource::new("icon.png", vec![0x89, 0x50, 0x4e, 0x47]);
        assert_eq!(icon.name(), "icon.png");
        assert_eq!(icon.content(), &[0x89, 0x50, 0x4e, 0x47]);
    }
}
