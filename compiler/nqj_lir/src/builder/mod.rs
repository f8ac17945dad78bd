//! Procedure builder.
//!
//! [`ProcBuilder`] owns an arena of blocks under construction plus a
//! cursor naming the block that receives emitted instructions. Lowering
//! code positions the cursor, emits straight-line instructions, and ends
//! the block with one `terminate_*` call.

use smallvec::SmallVec;

use crate::ir::{
    id_u32, BasicBlock, BinOp, BlockId, Instr, LirType, Operand, Param, Proc, TempVar, Terminator,
};

/// A block whose terminator may still be missing.
struct BlockBuilder {
    id: BlockId,
    name: String,
    body: Vec<Instr>,
    terminator: Option<Terminator>,
}

impl BlockBuilder {
    fn new(id: BlockId, name: String) -> Self {
        BlockBuilder {
            id,
            name,
            body: Vec::new(),
            terminator: None,
        }
    }
}

pub struct ProcBuilder {
    name: String,
    return_type: LirType,
    params: Vec<Param>,
    blocks: Vec<BlockBuilder>,
    current_block: BlockId,
    var_types: Vec<LirType>,
    var_names: Vec<String>,
}

impl ProcBuilder {
    /// Start the body of a declared procedure, positioned at a fresh entry block.
    ///
    /// The declaration's parameter temporaries stay valid in the body.
    pub fn new(declaration: &Proc) -> Self {
        let entry = BlockId::new(0);
        ProcBuilder {
            name: declaration.name.clone(),
            return_type: declaration.return_type.clone(),
            params: declaration.params.clone(),
            blocks: vec![BlockBuilder::new(entry, "entry".to_owned())],
            current_block: entry,
            var_types: declaration.var_types.clone(),
            var_names: declaration.var_names.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn return_type(&self) -> &LirType {
        &self.return_type
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    // Block management

    pub fn new_block(&mut self, name: &str) -> BlockId {
        let id = BlockId::new(id_u32(self.blocks.len()));
        self.blocks.push(BlockBuilder::new(id, name.to_owned()));
        id
    }

    /// Move the insertion point to `block`.
    pub fn position_at(&mut self, block: BlockId) {
        debug_assert!(
            block.index() < self.blocks.len(),
            "BlockId {} out of bounds (have {} blocks)",
            block.raw(),
            self.blocks.len()
        );
        self.current_block = block;
    }

    #[inline]
    pub fn current_block(&self) -> BlockId {
        self.current_block
    }

    pub fn entry_block(&self) -> BlockId {
        BlockId::new(0)
    }

    /// Whether the current block already ends in a terminator.
    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.blocks[self.current_block.index()].terminator.is_some()
    }

    // Variable allocation

    /// Allocate a temporary of the given type.
    pub fn fresh_var(&mut self, ty: LirType, name: &str) -> TempVar {
        let id = TempVar::new(id_u32(self.var_types.len()));
        self.var_types.push(ty);
        self.var_names.push(name.to_owned());
        id
    }

    #[inline]
    pub fn var_type(&self, var: TempVar) -> &LirType {
        &self.var_types[var.index()]
    }

    /// All temporary types so far, indexed by `TempVar::index()`.
    pub fn var_types(&self) -> &[LirType] {
        &self.var_types
    }

    // Instruction emission

    fn push(&mut self, instr: Instr) {
        let block = &mut self.blocks[self.current_block.index()];
        debug_assert!(
            block.terminator.is_none(),
            "emitting into terminated block {}",
            self.current_block.raw()
        );
        block.body.push(instr);
    }

    /// Stack slot for one `ty`; the result is a `ty*`.
    pub fn emit_alloca(&mut self, ty: LirType, name: &str) -> TempVar {
        let dst = self.fresh_var(ty.clone().pointer_to(), name);
        self.push(Instr::Alloca { dst, ty });
        dst
    }

    /// Zeroed heap memory of `size` bytes; the result is a `byte*`.
    pub fn emit_alloc(&mut self, size: Operand, name: &str) -> TempVar {
        let dst = self.fresh_var(LirType::Byte.pointer_to(), name);
        self.push(Instr::Alloc { dst, size });
        dst
    }

    pub fn emit_load(&mut self, address: Operand, ty: LirType, name: &str) -> TempVar {
        let dst = self.fresh_var(ty, name);
        self.push(Instr::Load { dst, address });
        dst
    }

    pub fn emit_store(&mut self, address: Operand, value: Operand) {
        self.push(Instr::Store { address, value });
    }

    /// Address computation; `ty` is the resulting pointer type.
    pub fn emit_gep(
        &mut self,
        base: Operand,
        indices: SmallVec<[Operand; 3]>,
        ty: LirType,
        name: &str,
    ) -> TempVar {
        debug_assert!(ty.pointee().is_some(), "getelementptr must yield a pointer");
        let dst = self.fresh_var(ty, name);
        self.push(Instr::GetElementPtr { dst, base, indices });
        dst
    }

    pub fn emit_binary(&mut self, left: Operand, op: BinOp, right: Operand, name: &str) -> TempVar {
        let dst = self.fresh_var(op.result_type(), name);
        self.push(Instr::BinaryOp {
            dst,
            left,
            op,
            right,
        });
        dst
    }

    pub fn emit_bitcast(&mut self, value: Operand, ty: LirType, name: &str) -> TempVar {
        let dst = self.fresh_var(ty, name);
        self.push(Instr::Bitcast { dst, value });
        dst
    }

    pub fn emit_call(
        &mut self,
        function: Operand,
        args: SmallVec<[Operand; 4]>,
        ret: LirType,
        name: &str,
    ) -> TempVar {
        let dst = self.fresh_var(ret, name);
        self.push(Instr::Call {
            dst,
            function,
            args,
        });
        dst
    }

    pub fn emit_print(&mut self, value: Operand) {
        self.push(Instr::Print { value });
    }

    pub fn emit_comment(&mut self, text: impl Into<String>) {
        self.push(Instr::Comment { text: text.into() });
    }

    // Terminators

    fn set_terminator(&mut self, terminator: Terminator) {
        let block = &mut self.blocks[self.current_block.index()];
        debug_assert!(
            block.terminator.is_none(),
            "block {} already terminated",
            self.current_block.raw()
        );
        block.terminator = Some(terminator);
    }

    pub fn terminate_branch(&mut self, cond: Operand, then_block: BlockId, else_block: BlockId) {
        self.set_terminator(Terminator::Branch {
            cond,
            then_block,
            else_block,
        });
    }

    pub fn terminate_jump(&mut self, target: BlockId) {
        self.set_terminator(Terminator::Jump { target });
    }

    pub fn terminate_return(&mut self, value: Operand) {
        self.set_terminator(Terminator::Return { value });
    }

    pub fn terminate_halt(&mut self, message: impl Into<String>) {
        self.set_terminator(Terminator::HaltWithError {
            message: message.into(),
        });
    }

    // Finalization

    /// Consume the builder and produce the finished [`Proc`].
    ///
    /// Blocks left without a terminator halt with a missing-return error
    /// (with a tracing warning).
    pub fn finish(self) -> Proc {
        let name = self.name;
        let blocks = self
            .blocks
            .into_iter()
            .map(|bb| {
                let terminator = bb.terminator.unwrap_or_else(|| {
                    tracing::warn!(
                        proc = %name,
                        block = bb.id.raw(),
                        "unterminated block in LIR, adding halt"
                    );
                    Terminator::HaltWithError {
                        message: format!("Missing return in procedure {name}"),
                    }
                });
                BasicBlock {
                    id: bb.id,
                    name: bb.name,
                    body: bb.body,
                    terminator,
                }
            })
            .collect();

        Proc {
            name,
            return_type: self.return_type,
            params: self.params,
            blocks,
            var_types: self.var_types,
            var_names: self.var_names,
        }
    }
}
