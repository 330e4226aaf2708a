//! Merge-at-path over `toml_edit` documents.

use anyhow::{Result, anyhow, bail};
use toml_edit::{DocumentMut, Item, Table, TableLike};

/// Replaces or inserts the leaf named by the last segment of `path`.
///
/// Intermediate segments may be standard, dotted or inline tables; missing
/// ones are created at the end of their parent (inline when the parent is
/// inline). Everything else in the document (sibling keys, order, comments,
/// whitespace) is left as parsed. When an existing scalar is replaced, its
/// surrounding decor (e.g. a trailing comment) is kept.
pub fn merge_at_path(doc: &mut DocumentMut, path: &[&str], value: Item) -> Result<()> {
    let Some((leaf, parents)) = path.split_last() else {
        bail!("merge path cannot be empty");
    };
    if value.is_none() {
        bail!("cannot merge an empty item at `{}`", path.join("."));
    }

    let mut table: &mut dyn TableLike = doc.as_table_mut();
    for (depth, key) in parents.iter().enumerate() {
        if table.get(key).is_none() {
            table.insert(key, Item::Table(Table::new()));
        }
        table = table
            .get_mut(key)
            .and_then(Item::as_table_like_mut)
            .ok_or_else(|| anyhow!("`{}` is not a table", path[..=depth].join(".")))?;
    }

    let mut value = value;
    match table.get_mut(leaf) {
        Some(slot) => {
            if let (Item::Value(old), Item::Value(new)) = (&*slot, &mut value) {
                *new.decor_mut() = old.decor().clone();
            }
            *slot = value;
        }
        None => {
            table.insert(leaf, value);
        }
    }

    Ok(())
}
