use nqj_ir::{ensure_sufficient_stack, ExprId, StmtId, StmtKind, StmtRange};

use super::FnLowerer;
use crate::TranslateError;

impl FnLowerer<'_, '_> {
    pub(super) fn lower_stmt(&mut self, stmt: StmtId) -> Result<(), TranslateError> {
        let module = self.tr.module;
        let node = module.stmt(stmt);
        let comments = self.tr.options.statement_comments;
        let line = module.line_of(node.span);
        if comments {
            self.builder
                .emit_comment(format!("{line} start statement: {}", node.kind.label()));
        }

        ensure_sufficient_stack(|| match &node.kind {
            StmtKind::Block(range) => self.lower_block(*range),
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => self.lower_if(*cond, *then_branch, *else_branch),
            StmtKind::While { cond, body } => self.lower_while(*cond, *body),
            StmtKind::Assign { address, value } => self.lower_assign(*address, *value),
            StmtKind::Expr(expr) => self.lower_expr(*expr).map(drop),
            StmtKind::Return(value) => self.lower_return(*value),
            StmtKind::VarDecl(_) => Ok(()),
        })?;

        if comments && !self.builder.is_terminated() {
            self.builder
                .emit_comment(format!("{line} end statement: {}", node.kind.label()));
        }
        Ok(())
    }

    /// Statements after a terminator are unreachable and are dropped.
    fn lower_block(&mut self, range: StmtRange) -> Result<(), TranslateError> {
        for &stmt in self.tr.module.stmts_in(range) {
            if self.builder.is_terminated() {
                tracing::trace!(?stmt, "dropping unreachable statement");
                break;
            }
            self.lower_stmt(stmt)?;
        }
        Ok(())
    }

    fn lower_if(
        &mut self,
        cond: ExprId,
        then_branch: StmtId,
        else_branch: StmtId,
    ) -> Result<(), TranslateError> {
        let cond = self.lower_expr(cond)?;
        let then_bb = self.builder.new_block("if_then");
        let else_bb = self.builder.new_block("if_else");
        self.builder.terminate_branch(cond, then_bb, else_bb);

        self.builder.position_at(then_bb);
        self.lower_stmt(then_branch)?;
        let then_end = (!self.builder.is_terminated()).then(|| self.builder.current_block());

        self.builder.position_at(else_bb);
        self.lower_stmt(else_branch)?;
        let else_end = (!self.builder.is_terminated()).then(|| self.builder.current_block());

        if then_end.is_none() && else_end.is_none() {
            // Both arms return or halt; the current block stays terminated.
            return Ok(());
        }
        let merge = self.builder.new_block("if_end");
        for open in [then_end, else_end].into_iter().flatten() {
            self.builder.position_at(open);
            self.builder.terminate_jump(merge);
        }
        self.builder.position_at(merge);
        Ok(())
    }

    fn lower_while(&mut self, cond: ExprId, body: StmtId) -> Result<(), TranslateError> {
        let cond_bb = self.builder.new_block("loop_cond");
        let body_bb = self.builder.new_block("loop_body");
        let end_bb = self.builder.new_block("loop_end");
        self.builder.terminate_jump(cond_bb);

        self.builder.position_at(cond_bb);
        let cond = self.lower_expr(cond)?;
        self.builder.terminate_branch(cond, body_bb, end_bb);

        self.builder.position_at(body_bb);
        self.lower_stmt(body)?;
        if !self.builder.is_terminated() {
            self.builder.terminate_jump(cond_bb);
        }
        self.builder.position_at(end_bb);
        Ok(())
    }

    fn lower_assign(&mut self, address: ExprId, value: ExprId) -> Result<(), TranslateError> {
        let addr = self.lower_address(address)?;
        let value = self.lower_expr(value)?;
        let target = self.operand_type(&addr).pointee().cloned();
        let value = match target {
            Some(ty) => self.convert(value, &ty),
            None => value,
        };
        self.builder.emit_store(addr, value);
        Ok(())
    }

    fn lower_return(&mut self, value: ExprId) -> Result<(), TranslateError> {
        let value = self.lower_expr(value)?;
        let ret = self.builder.return_type().clone();
        let value = self.convert(value, &ret);
        self.builder.terminate_return(value);
        Ok(())
    }
}
