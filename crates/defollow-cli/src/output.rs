use serde::Serialize;

/// Pretty-print any serializable value as JSON on stdout. Used by every
/// subcommand's `--json` path so machine consumers get one stable shape.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Render an indented two-column listing, left column padded so the
/// annotations line up. Rows with no annotation print the name alone.
pub fn print_pairs(rows: &[(String, String)]) {
    let width = rows
        .iter()
        .filter(|(_, right)| !right.is_empty())
        .map(|(left, _)| left.len())
        .max()
        .unwrap_or(0);
    for (left, right) in rows {
        if right.is_empty() {
            println!("  {left}");
        } else {
            println!("  {left:width$}  ({right})");
        }
    }
}
