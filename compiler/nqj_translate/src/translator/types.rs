//! NQJ types to LIR types.

use nqj_lir::{LirType, Operand, StructField, StructId};
use nqj_types::{Idx, TypeData};

use super::Translator;
use crate::TranslateError;

impl Translator<'_> {
    /// LIR type of a checked NQJ type. Classes and arrays are pointers.
    pub(crate) fn lower_type(&mut self, ty: Idx) -> Result<LirType, TranslateError> {
        match self.typed.names.pool().data(ty) {
            TypeData::Int => Ok(LirType::Int),
            TypeData::Bool => Ok(LirType::Bool),
            TypeData::Null => Ok(LirType::NullPointer),
            TypeData::Any => Err(TranslateError::ErrorType),
            TypeData::Class(class) => Ok(self.object_pointer(class)),
            TypeData::Array(base) => {
                let elem = self.lower_type(base)?;
                Ok(LirType::Struct(self.array_struct(elem)).pointer_to())
            }
        }
    }

    /// The `{ length, [0 x elem] }` struct for `elem`, created on first use.
    pub(crate) fn array_struct(&mut self, elem: LirType) -> StructId {
        if let Some(&id) = self.array_structs.get(&elem) {
            return id;
        }
        let name = format!("array_{}", self.type_name(&elem));
        let id = self.prog.declare_struct(name);
        self.prog.define_struct(
            id,
            vec![
                StructField::new("length", LirType::Int),
                StructField::new(
                    "data",
                    LirType::Array {
                        elem: Box::new(elem.clone()),
                        len: 0,
                    },
                ),
            ],
        );
        tracing::trace!(struct_id = ?id, "array struct created");
        self.array_structs.insert(elem, id);
        id
    }

    /// Short name of a type for use inside generated names.
    pub(crate) fn type_name(&self, ty: &LirType) -> String {
        match ty {
            LirType::Int => "int".to_owned(),
            LirType::Bool => "bool".to_owned(),
            LirType::Byte => "byte".to_owned(),
            LirType::NullPointer => "null".to_owned(),
            LirType::Struct(id) => self.prog.struct_def(*id).name.clone(),
            LirType::Pointer(inner) => match **inner {
                LirType::Struct(id) => self.prog.struct_def(id).name.clone(),
                ref other => format!("{}_ptr", self.type_name(other)),
            },
            LirType::Array { elem, len } => format!("{}_x{len}", self.type_name(elem)),
            LirType::Proc { .. } => "proc".to_owned(),
        }
    }
}

/// Zero value stored into fresh locals, fields and array elements.
pub(crate) fn default_value(ty: &LirType) -> Operand {
    match ty {
        LirType::Bool => Operand::ConstBool(false),
        LirType::Pointer(_) | LirType::NullPointer => Operand::Null,
        _ => Operand::ConstInt(0),
    }
}
