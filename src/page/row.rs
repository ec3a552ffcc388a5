//! Staging slots for the record currently being assembled.
//!
//! One slot per column, created once from the column's type and reused for
//! every record. A slot only ever holds a value of its column's type; a setter
//! of another type is refused before anything is written. `reset` marks all
//! slots null again. `add_record` moves committed String and Json values into
//! the page reference lists, so a slot holds no allocation after a commit.

use eyre::{bail, Result};

use crate::schema::Schema;
use crate::types::{Timestamp, Type};

#[derive(Debug)]
pub(crate) enum SlotValue {
    Boolean(bool),
    Long(i64),
    Double(f64),
    String(String),
    Timestamp(Timestamp),
    Json(serde_json::Value),
}

impl SlotValue {
    fn for_type(column_type: Type) -> Self {
        match column_type {
            Type::Boolean => SlotValue::Boolean(false),
            Type::Long => SlotValue::Long(0),
            Type::Double => SlotValue::Double(0.0),
            Type::String => SlotValue::String(String::new()),
            Type::Timestamp => SlotValue::Timestamp(Timestamp::default()),
            Type::Json => SlotValue::Json(serde_json::Value::Null),
        }
    }

    fn column_type(&self) -> Type {
        match self {
            SlotValue::Boolean(_) => Type::Boolean,
            SlotValue::Long(_) => Type::Long,
            SlotValue::Double(_) => Type::Double,
            SlotValue::String(_) => Type::String,
            SlotValue::Timestamp(_) => Type::Timestamp,
            SlotValue::Json(_) => Type::Json,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Slot {
    pub(crate) null: bool,
    pub(crate) value: SlotValue,
}

#[derive(Debug)]
pub(crate) struct Row {
    slots: Vec<Slot>,
}

impl Row {
    pub(crate) fn new(schema: &Schema) -> Self {
        let slots = schema
            .columns()
            .iter()
            .map(|column| Slot {
                null: true,
                value: SlotValue::for_type(column.column_type()),
            })
            .collect();
        Self { slots }
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Slot] {
        &mut self.slots
    }

    #[cfg(test)]
    pub(crate) fn slot(&self, col_idx: usize) -> &Slot {
        &self.slots[col_idx]
    }

    fn slot_mut(&mut self, col_idx: usize) -> Result<&mut Slot> {
        let count = self.slots.len();
        self.slots.get_mut(col_idx).ok_or_else(|| {
            eyre::eyre!(
                "column index {} out of range for schema with {} columns",
                col_idx,
                count
            )
        })
    }

    fn typed_slot(&mut self, col_idx: usize, requested: Type) -> Result<&mut Slot> {
        let slot = self.slot_mut(col_idx)?;
        let declared = slot.value.column_type();
        if declared != requested {
            bail!(
                "column {} is declared {} but a {} value was set",
                col_idx,
                declared,
                requested
            );
        }
        Ok(slot)
    }

    pub(crate) fn set_null(&mut self, col_idx: usize) -> Result<()> {
        self.slot_mut(col_idx)?.null = true;
        Ok(())
    }

    pub(crate) fn set_boolean(&mut self, col_idx: usize, value: bool) -> Result<()> {
        let slot = self.typed_slot(col_idx, Type::Boolean)?;
        if let SlotValue::Boolean(v) = &mut slot.value {
            *v = value;
        }
        slot.null = false;
        Ok(())
    }

    pub(crate) fn set_long(&mut self, col_idx: usize, value: i64) -> Result<()> {
        let slot = self.typed_slot(col_idx, Type::Long)?;
        if let SlotValue::Long(v) = &mut slot.value {
            *v = value;
        }
        slot.null = false;
        Ok(())
    }

    pub(crate) fn set_double(&mut self, col_idx: usize, value: f64) -> Result<()> {
        let slot = self.typed_slot(col_idx, Type::Double)?;
        if let SlotValue::Double(v) = &mut slot.value {
            *v = value;
        }
        slot.null = false;
        Ok(())
    }

    pub(crate) fn set_string(&mut self, col_idx: usize, value: &str) -> Result<()> {
        let slot = self.typed_slot(col_idx, Type::String)?;
        if let SlotValue::String(v) = &mut slot.value {
            v.clear();
            v.push_str(value);
        }
        slot.null = false;
        Ok(())
    }

    pub(crate) fn set_timestamp(&mut self, col_idx: usize, value: Timestamp) -> Result<()> {
        let slot = self.typed_slot(col_idx, Type::Timestamp)?;
        if let SlotValue::Timestamp(v) = &mut slot.value {
            *v = value;
        }
        slot.null = false;
        Ok(())
    }

    pub(crate) fn set_json(&mut self, col_idx: usize, value: serde_json::Value) -> Result<()> {
        let slot = self.typed_slot(col_idx, Type::Json)?;
        if let SlotValue::Json(v) = &mut slot.value {
            *v = value;
        }
        slot.null = false;
        Ok(())
    }

    pub(crate) fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.null = true;
            if let SlotValue::Json(v) = &mut slot.value {
                *v = serde_json::Value::Null;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::builder()
            .add("flag", Type::Boolean)
            .add("name", Type::String)
            .add("doc", Type::Json)
            .build()
            .unwrap()
    }

    #[test]
    fn slots_start_null() {
        let row = Row::new(&schema());
        assert!(row.slot(0).null);
        assert!(row.slot(1).null);
        assert!(row.slot(2).null);
    }

    #[test]
    fn mismatched_setter_leaves_slot_untouched() {
        let mut row = Row::new(&schema());
        row.set_string(1, "keep").unwrap();

        let err = row.set_long(1, 5).unwrap_err();
        assert!(err.to_string().contains("declared string but a long value"));

        let slot = row.slot(1);
        assert!(!slot.null);
        assert!(matches!(&slot.value, SlotValue::String(s) if s == "keep"));
    }

    #[test]
    fn out_of_range_column_is_refused() {
        let mut row = Row::new(&schema());
        let err = row.set_null(3).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn reset_marks_all_null() {
        let mut row = Row::new(&schema());
        row.set_boolean(0, true).unwrap();
        row.set_string(1, "a fairly long string value").unwrap();
        row.set_json(2, serde_json::json!([1, 2, 3])).unwrap();
        row.reset();

        assert!(row.slot(0).null);
        assert!(row.slot(1).null);
        assert!(matches!(&row.slot(2).value, SlotValue::Json(serde_json::Value::Null)));
    }
}
