//! Summarization prompt assembly.
//!
//! The prompt is built by appending fixed instruction text and the three
//! inputs in sequence. Inputs are never scanned for placeholders, so braces,
//! `$` signs or anything resembling template syntax in table or context text
//! reach the service verbatim.

const INSTRUCTION: &str = "You are an assistant tasked with summarizing html table with context.\n\
Based on contexts below, please summarize the table using the relevant context.\n\n";

/// Inputs of one table summarization prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prompt<'a> {
    /// Rendered table
    pub table: &'a str,
    /// Context kept from the preceding text
    pub prev_context: &'a str,
    /// Context kept from the following text
    pub after_context: &'a str,
}

impl<'a> Prompt<'a> {
    /// Create a prompt.
    pub fn new(table: &'a str, prev_context: &'a str, after_context: &'a str) -> Self {
        Self {
            table,
            prev_context,
            after_context,
        }
    }

    /// Render the prompt text.
    ///
    /// # Examples
    ///
    /// ```
    /// use table_context::summarize::Prompt;
    ///
    /// let text = Prompt::new("| {qty} |", "", "").render();
    /// assert!(text.contains("table: | {qty} | Following context:"));
    /// ```
    pub fn render(&self) -> String {
        let mut text = String::with_capacity(
            INSTRUCTION.len() + self.table.len() + self.prev_context.len() + self.after_context.len() + 64,
        );
        text.push_str(INSTRUCTION);
        text.push_str("Previous context: ");
        text.push_str(self.prev_context);
        text.push_str(" table: ");
        text.push_str(self.table);
        text.push_str(" Following context: ");
        text.push_str(self.after_context);
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let text = Prompt::new("| a |", "before\n", "after\n").render();
        assert!(text.starts_with("You are an assistant tasked with summarizing html table"));
        assert!(text.ends_with(
            "Previous context: before\n table: | a | Following context: after\n"
        ));
    }

    #[test]
    fn test_template_syntax_is_literal() {
        let table = "| {table} | ${prev_context} | {{x}} |";
        let prev = "{after_context}";
        let after = "$table }{";
        let text = Prompt::new(table, prev, after).render();

        assert!(text.contains(table));
        assert!(text.contains("Previous context: {after_context} table:"));
        assert!(text.ends_with("Following context: $table }{"));
    }
}
