use crate::identity::{permitted_routes, Identity, Route};

const MAX_COL_WIDTH: usize = 60;

/// Two-column field/value table for an identity, JSON when `HRMS_OUTPUT=json`.
pub fn render_identity(identity: &Identity) -> String {
    if json_output() {
        return serde_json::to_string_pretty(identity).unwrap_or_default();
    }
    let opt = |v: &Option<String>| v.clone().unwrap_or_else(|| "NULL".to_string());
    let rows = vec![
        vec!["id".to_string(), identity.id.to_string()],
        vec!["username".to_string(), opt(&identity.username)],
        vec!["email".to_string(), identity.email.clone()],
        vec!["role".to_string(), identity.role.clone()],
        vec!["full_name".to_string(), opt(&identity.full_name)],
        vec!["employee_id".to_string(), opt(&identity.employee_id)],
        vec!["department".to_string(), opt(&identity.department)],
        vec!["is_active".to_string(), identity.is_active.to_string()],
    ];
    render_table(&["field".to_string(), "value".to_string()], &rows)
}

/// Permitted routes for a role, in navigation order.
pub fn render_routes(role: &str) -> String {
    let routes: &[Route] = permitted_routes(role);
    if json_output() {
        let ids: Vec<&str> = routes.iter().map(|r| r.id()).collect();
        return serde_json::json!({ "role": role, "routes": ids }).to_string();
    }
    if routes.is_empty() {
        return format!("role '{}' has no permitted routes", role);
    }
    let rows: Vec<Vec<String>> = routes
        .iter()
        .enumerate()
        .map(|(i, r)| vec![(i + 1).to_string(), r.id().to_string()])
        .collect();
    render_table(&["#".to_string(), "route".to_string()], &rows)
}

fn json_output() -> bool {
    std::env::var("HRMS_OUTPUT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false)
}

fn render_table(cols: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = cols.iter().map(|s| s.chars().count().min(MAX_COL_WIDTH)).collect();
    for r in rows {
        for (i, cell) in r.iter().enumerate().take(cols.len()) {
            widths[i] = widths[i].max(cell.chars().count().min(MAX_COL_WIDTH));
        }
    }
    let sep = build_separator(&widths);
    let mut out = Vec::with_capacity(rows.len() + 4);
    out.push(sep.clone());
    out.push(build_row(cols, &widths));
    out.push(sep.clone());
    for r in rows {
        out.push(build_row(r, &widths));
    }
    out.push(sep);
    out.join("\n")
}

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('+');
    for w in widths {
        s.push_str(&"-".repeat(*w + 2));
        s.push('+');
    }
    s
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('|');
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).cloned().unwrap_or_default();
        let text = truncate(&cell, *w);
        s.push(' ');
        if is_numeric_like(&text) {
            s.push_str(&" ".repeat(w.saturating_sub(text.chars().count())));
            s.push_str(&text);
        } else {
            s.push_str(&text);
            s.push_str(&" ".repeat(w.saturating_sub(text.chars().count())));
        }
        s.push(' ');
        s.push('|');
    }
    s
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max { return s.to_string(); }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn is_numeric_like(s: &str) -> bool {
    !s.is_empty() && s.parse::<f64>().is_ok()
}
