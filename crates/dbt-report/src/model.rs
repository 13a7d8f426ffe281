use serde::Deserialize;

/// One `key: value` line of a report. An empty key makes it plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub key: String,
    pub value: String,
}

impl ReportLine {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(String::new(), value)
    }

    /// How the line reads in the paginated document.
    pub fn display(&self) -> String {
        if self.key.is_empty() {
            self.value.clone()
        } else {
            format!("{}: {}", self.key, self.value)
        }
    }
}

/// An image to embed on its own page; `data` is base64 or a `data:` URL.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageAttachment {
    pub name: String,
    pub data: String,
}

#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub title: String,
    pub lines: Vec<ReportLine>,
    pub images: Vec<ImageAttachment>,
}

impl ReportRequest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
            images: Vec::new(),
        }
    }

    pub fn line(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.lines.push(ReportLine::new(key, value));
        self
    }

    pub fn image(mut self, attachment: ImageAttachment) -> Self {
        self.images.push(attachment);
        self
    }

    /// Metric/value report, one line per metric in the order given.
    /// `totalStudents` becomes `TOTAL STUDENTS`.
    pub fn metrics(
        title: impl Into<String>,
        metrics: &serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        let lines = metrics
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                };
                ReportLine::new(humanize_key(key), value)
            })
            .collect();
        Self {
            title: title.into(),
            lines,
            images: Vec::new(),
        }
    }

    /// Guide document: free text, one line per paragraph.
    pub fn guide(title: impl Into<String>, content: &str) -> Self {
        Self {
            title: title.into(),
            lines: content.lines().map(ReportLine::text).collect(),
            images: Vec::new(),
        }
    }
}

/// `camelCase` keys to upper-case words. Other separators are kept as given.
pub fn humanize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_uppercase() {
            out.push(' ');
        }
        out.push(c);
    }
    out.trim().to_uppercase()
}
