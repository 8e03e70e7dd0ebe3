use super::field::Field;
use super::ty::Ty;
use super::value::{self, Value};
use crate::Result;
use chrono::Utc;
use std::sync::Arc;

/// Marks a record instance's soft-delete attribute as deleted in place.
pub type SoftDeleteFn = Arc<dyn Fn(&mut Value) -> Result<()> + Send + Sync>;

/// Selects the deletion-marking closure for a soft-delete field.
///
/// The choice is made once at construction time from the field's declared
/// static type, not per call. `declared` is the attribute's type before
/// dereferencing, so the pointer-shaped variants stay distinguishable.
pub(crate) fn updater(declared: &Ty, field: &Field) -> SoftDeleteFn {
    match declared {
        Ty::Time => Arc::new(|fv| {
            *fv = Value::Time(Utc::now());
            Ok(())
        }),
        Ty::NullTime => Arc::new(|fv| {
            *fv = Value::Time(Utc::now());
            Ok(())
        }),
        Ty::NullI64 => Arc::new(|fv| {
            *fv = Value::I64(value::epoch_nanos(&Utc::now()));
            Ok(())
        }),
        Ty::I64 => Arc::new(|fv| {
            *fv = Value::I64(value::epoch_nanos(&Utc::now()));
            Ok(())
        }),
        Ty::Option(inner) => match inner.as_ref() {
            // Pointer-shaped: allocate a fresh value and rebind.
            Ty::Time => Arc::new(|fv| {
                let now = Utc::now();
                *fv = Value::Time(now);
                Ok(())
            }),
            Ty::I64 => Arc::new(|fv| {
                let nanos = value::epoch_nanos(&Utc::now());
                *fv = Value::I64(nanos);
                Ok(())
            }),
            _ => fallback(field),
        },
        _ => fallback(field),
    }
}

/// Delegates to the field's checked scan with the current time.
fn fallback(field: &Field) -> SoftDeleteFn {
    let field = field.clone();
    Arc::new(move |fv| {
        let mut dest = Value::Null;
        field.scan_with_check(&mut dest, Value::Time(Utc::now()))?;
        *fv = dest;
        Ok(())
    })
}
