use core::fmt::{self, Display};

pub mod chat;
pub mod notification;
pub mod post;
pub mod user;

/// One block of console output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub title: String,
    pub description: String,
    pub fields: Vec<(String, String)>,
}

impl Response {
    pub fn notice(title: impl Display, description: impl Display) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            fields: vec![],
        }
    }

    pub fn field(mut self, name: impl Display, value: impl Display) -> Self {
        self.fields.push((name.to_string(), value.to_string()));
        self
    }
}

impl Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.title)?;
        if !self.description.is_empty() {
            writeln!(f, "{}", self.description)?;
        }
        for (name, value) in &self.fields {
            writeln!(f, "  {} {}", name, value)?;
        }

        Ok(())
    }
}

fn or_dash(s: Option<&str>) -> &str {
    match s {
        Some(s) if !s.is_empty() => s,
        _ => "-",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_title_then_fields() {
        let r = Response::notice("liked", "").field("id:", 42);
        assert_eq!(r.to_string(), "== liked ==\n  id: 42\n");

        let r = Response::notice("error", "Failed to load");
        assert_eq!(r.to_string(), "== error ==\nFailed to load\n");
    }
}
