//! Runtime checks compiled into the generated program.
//!
//! Each check branches to a fresh block that halts with a line-tagged
//! message; lowering continues in the success block.

use nqj_lir::{BinOp, LirType, Operand};
use smallvec::smallvec;

use super::FnLowerer;

impl FnLowerer<'_, '_> {
    /// Halt with `message` when `pointer` is null.
    pub(super) fn null_check(&mut self, pointer: &Operand, message: String) {
        let is_null = self
            .builder
            .emit_binary(pointer.clone(), BinOp::Eq, Operand::Null, "is_null");
        let null_bb = self.builder.new_block("when_null");
        let ok_bb = self.builder.new_block("not_null");
        self.builder.terminate_branch(Operand::Var(is_null), null_bb, ok_bb);

        self.builder.position_at(null_bb);
        self.builder.terminate_halt(message);
        self.builder.position_at(ok_bb);
    }

    /// Load the length word of a non-null array pointer.
    pub(super) fn array_length(&mut self, array: &Operand) -> Operand {
        let addr = self.builder.emit_gep(
            array.clone(),
            smallvec![Operand::ConstInt(0), Operand::ConstInt(0)],
            LirType::Int.pointer_to(),
            "length_addr",
        );
        Operand::Var(self.builder.emit_load(Operand::Var(addr), LirType::Int, "length"))
    }

    /// Halt unless `0 <= index <= length - 1`.
    pub(super) fn bounds_check(&mut self, index: &Operand, length: Operand, line: u32) {
        let below = self
            .builder
            .emit_binary(index.clone(), BinOp::Slt, Operand::ConstInt(0), "below_zero");
        let last = self
            .builder
            .emit_binary(length, BinOp::Sub, Operand::ConstInt(1), "last_index");
        let above = self
            .builder
            .emit_binary(Operand::Var(last), BinOp::Slt, index.clone(), "above_last");
        let out = self.builder.emit_binary(
            Operand::Var(below),
            BinOp::Or,
            Operand::Var(above),
            "out_of_bounds",
        );
        let fail_bb = self.builder.new_block("out_of_bounds");
        let ok_bb = self.builder.new_block("index_in_range");
        self.builder.terminate_branch(Operand::Var(out), fail_bb, ok_bb);

        self.builder.position_at(fail_bb);
        self.builder
            .terminate_halt(format!("Index out of bounds error in line {line}"));
        self.builder.position_at(ok_bb);
    }

    /// Checked signed division.
    ///
    /// A zero divisor halts. `i32::MIN / -1` yields `i32::MIN` without
    /// executing the overflowing division.
    pub(super) fn checked_div(&mut self, left: Operand, right: Operand, line: u32) -> Operand {
        let result = self.builder.emit_alloca(LirType::Int, "div_slot");
        let is_zero = self
            .builder
            .emit_binary(right.clone(), BinOp::Eq, Operand::ConstInt(0), "is_zero");
        let zero_bb = self.builder.new_block("div_by_zero");
        let nonzero_bb = self.builder.new_block("div_nonzero");
        self.builder.terminate_branch(Operand::Var(is_zero), zero_bb, nonzero_bb);

        self.builder.position_at(zero_bb);
        self.builder
            .terminate_halt(format!("Division by zero in line {line}"));

        self.builder.position_at(nonzero_bb);
        let minus_one = self
            .builder
            .emit_binary(right.clone(), BinOp::Eq, Operand::ConstInt(-1), "is_minus_one");
        let min_int = self.builder.emit_binary(
            left.clone(),
            BinOp::Eq,
            Operand::ConstInt(i32::MIN),
            "is_min_int",
        );
        let overflow = self.builder.emit_binary(
            Operand::Var(min_int),
            BinOp::And,
            Operand::Var(minus_one),
            "overflows",
        );
        self.builder
            .emit_store(Operand::Var(result), Operand::ConstInt(i32::MIN));
        let divide_bb = self.builder.new_block("div_no_overflow");
        let end_bb = self.builder.new_block("div_end");
        self.builder.terminate_branch(Operand::Var(overflow), end_bb, divide_bb);

        self.builder.position_at(divide_bb);
        let quotient = self.builder.emit_binary(left, BinOp::Sdiv, right, "quotient");
        self.builder
            .emit_store(Operand::Var(result), Operand::Var(quotient));
        self.builder.terminate_jump(end_bb);

        self.builder.position_at(end_bb);
        Operand::Var(self.builder.emit_load(Operand::Var(result), LirType::Int, "div_result"))
    }
}
