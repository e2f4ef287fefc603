//! Table formatting utilities

use prettytable::{Cell, Row, Table};

/// Table with bold titles and no separators between rows
pub fn create_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_format(*prettytable::format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(Row::new(
        headers
            .iter()
            .map(|h| Cell::new(h).style_spec("b"))
            .collect(),
    ));
    table
}

pub fn add_table_row<I>(table: &mut Table, cells: I)
where
    I: IntoIterator,
    I::Item: ToString,
{
    table.add_row(Row::new(
        cells
            .into_iter()
            .map(|cell| Cell::new(&cell.to_string()))
            .collect(),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_accept_mixed_cell_sources() {
        let mut table = create_table(&["Name", "Count"]);
        add_table_row(&mut table, ["grass".to_string(), 3.to_string()]);
        add_table_row(&mut table, ["road", "7"]);
        assert_eq!(table.len(), 2);
        let rendered = table.to_string();
        assert!(rendered.contains("grass") && rendered.contains('7'));
    }
}
