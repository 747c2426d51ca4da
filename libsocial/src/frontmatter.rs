//! Header blocks for markdown records
//!
//! Ideas and drafts are stored as markdown files that start with a block of
//! `key: value` lines fenced by `---`:
//!
//! ```text
//! ---
//! idea_id: 2024-01-01T09-00-00Z__release-notes
//! platform: twitter
//! status: draft
//! ---
//! body text
//! ```
//!
//! Key order is preserved on rewrite so a status change only touches one line.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    fields: Vec<(String, String)>,
    pub body: String,
}

impl Document {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            fields: Vec::new(),
            body: body.into(),
        }
    }

    /// Split a file into header fields and body
    ///
    /// Content without a complete header block is treated as all body.
    pub fn parse(content: &str) -> Self {
        let mut lines = content.split_inclusive('\n');

        let mut consumed = match lines.next() {
            Some(first) if first.trim_end() == "---" => first.len(),
            _ => return Self::new(content),
        };

        let mut fields = Vec::new();

        for line in lines {
            consumed += line.len();
            if line.trim_end() == "---" {
                return Self {
                    fields,
                    body: content[consumed..].to_string(),
                };
            }
            if let Some((key, value)) = line.split_once(':') {
                fields.push((key.trim().to_string(), value.trim().to_string()));
            }
        }

        // No closing fence
        Self::new(content)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set a field, replacing in place when it already exists
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.fields.push((key.to_string(), value)),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn render(&self) -> String {
        let mut out = String::from("---\n");
        for (key, value) in &self.fields {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
        out.push_str("---\n");
        out.push_str(&self.body);
        out
    }
}
