use crate::notes::repo_types::Note;

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders the "All Notes" page: one heading and paragraph per note.
pub fn render_notes_page(notes: &[Note]) -> String {
    let mut page = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<link rel=\"stylesheet\" href=\"/static/css/styles.css\">\n</head>\n<body>\n<h1>All Notes</h1>\n",
    );
    for note in notes {
        let owners = note.owners.join(", ");
        page.push_str(&format!(
            "<h3>{} (Belongs to [{}]):</h3>\n<p>{}</p>\n<br>\n",
            escape(&note.title),
            escape(&owners),
            escape(&note.content),
        ));
    }
    page.push_str("</body>\n</html>\n");
    page
}
