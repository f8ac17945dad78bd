//! Address (l-value) lowering.

use nqj_ir::{ExprId, ExprKind};
use nqj_lir::{LirType, Operand};
use nqj_types::Resolution;
use smallvec::smallvec;

use super::{const_index, FnLowerer};
use crate::TranslateError;

impl FnLowerer<'_, '_> {
    /// Pointer to the storage an address expression denotes.
    pub(super) fn lower_address(&mut self, expr: ExprId) -> Result<Operand, TranslateError> {
        let module = self.tr.module;
        match &module.expr(expr).kind {
            ExprKind::VarUse(_) => match self.resolution(expr, "variable")? {
                Resolution::Var(var) => Ok(Operand::Var(self.slot_of(var)?)),
                _ => Err(TranslateError::MissingResolution {
                    expr,
                    expected: "variable",
                }),
            },
            ExprKind::FieldAccess { receiver, field } => {
                let Resolution::Field { class, field: var } = self.resolution(expr, "field")? else {
                    return Err(TranslateError::MissingResolution {
                        expr,
                        expected: "field",
                    });
                };
                let object = self.lower_expr(*receiver)?;
                if !self.is_never_null(*receiver) {
                    let line = self.line_of(expr);
                    self.null_check(&object, format!("Nullpointer exception in line {line}"));
                }
                let slot = self.tr.field_slot(class, var)?;
                let object_struct = self.tr.class_structs(class).object;
                let ty = self
                    .tr
                    .prog
                    .field_type(object_struct, slot as usize)
                    .cloned()
                    .ok_or(TranslateError::UnboundVariable(var))?;
                let name = format!("{}_addr", self.tr.name_str(*field));
                Ok(Operand::Var(self.builder.emit_gep(
                    object,
                    smallvec![Operand::ConstInt(0), const_index(slot as usize)],
                    ty.pointer_to(),
                    &name,
                )))
            }
            ExprKind::ArrayLookup { array, index } => {
                let Resolution::Array(array_ty) = self.resolution(expr, "array type")? else {
                    return Err(TranslateError::MissingResolution {
                        expr,
                        expected: "array type",
                    });
                };
                let line = self.line_of(expr);
                let base = self.lower_expr(*array)?;
                self.null_check(&base, format!("Nullpointer exception in line {line}"));
                let index = self.lower_expr(*index)?;
                let length = self.array_length(&base);
                self.bounds_check(&index, length, line);

                let elem_ty = self
                    .tr
                    .typed
                    .names
                    .pool()
                    .array_base(array_ty)
                    .ok_or(TranslateError::ErrorType)?;
                let elem: LirType = self.tr.lower_type(elem_ty)?;
                Ok(Operand::Var(self.builder.emit_gep(
                    base,
                    smallvec![Operand::ConstInt(0), Operand::ConstInt(1), index],
                    elem.pointer_to(),
                    "elem_addr",
                )))
            }
            _ => Err(TranslateError::NotAnAddress(expr)),
        }
    }
}
