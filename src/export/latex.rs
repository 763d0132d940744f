use super::{Align, TableRow};

/// `booktabs` tabular, one line per row.
pub fn render<R: TableRow>(rows: &[R]) -> String {
    let spec: String = R::COLUMNS
        .iter()
        .map(|c| match c.align {
            Align::Left => 'l',
            Align::Right => 'r',
        })
        .collect();
    let header: Vec<String> = R::COLUMNS.iter().map(|c| escape(c.name)).collect();

    let mut out = String::new();
    out.push_str(&format!("\\begin{{tabular}}{{{spec}}}\n"));
    out.push_str("\\toprule\n");
    out.push_str(&header.join(" & "));
    out.push_str(" \\\\\n\\midrule\n");
    for row in rows {
        let cells: Vec<String> = row.cells().iter().map(|c| escape(c)).collect();
        out.push_str(&cells.join(" & "));
        out.push_str(" \\\\\n");
    }
    out.push_str("\\bottomrule\n\\end{tabular}\n");
    out
}

/// Escape characters with special meaning in LaTeX text mode.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(ch);
            }
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            _ => out.push(ch),
        }
    }
    out
}
