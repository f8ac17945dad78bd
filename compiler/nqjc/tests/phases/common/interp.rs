//! A small LIR interpreter used to observe what generated programs do.
//!
//! Memory is a list of allocations, each a vector of cells holding one
//! scalar value. Object, vtable and array layouts only contain scalars and
//! trailing element arrays, so a `getelementptr` with indices `[0, a, b]`
//! addresses cell `a + b` of the base allocation.

use nqj_lir::{BinOp, Const, Instr, Operand, ProcId, Prog, Terminator};

const FUEL: u64 = 5_000_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Int(i32),
    Bool(bool),
    Null,
    Ptr { alloc: usize, offset: usize },
    Proc(ProcId),
}

/// How a program ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Returned(i32),
    Halted(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Run {
    pub outcome: Outcome,
    /// Values printed by `printInt`, in order.
    pub output: Vec<i32>,
}

enum Flow {
    Return(Value),
    Halt(String),
}

struct Machine<'p> {
    prog: &'p Prog,
    memory: Vec<Vec<Option<Value>>>,
    globals: Vec<usize>,
    output: Vec<i32>,
    fuel: u64,
}

/// Execute `entry` with no arguments.
///
/// `Err` means the generated code did something the runtime checks should
/// have prevented (or the interpreter ran out of fuel).
pub fn run(prog: &Prog, entry: &str) -> Result<Run, String> {
    let entry = prog
        .proc_by_name(entry)
        .ok_or_else(|| format!("no procedure named {entry}"))?;
    let mut machine = Machine {
        prog,
        memory: Vec::new(),
        globals: Vec::new(),
        output: Vec::new(),
        fuel: FUEL,
    };
    for (_, global) in prog.globals() {
        let mut cells = Vec::new();
        flatten(&global.init, &mut cells);
        machine.memory.push(cells.into_iter().map(Some).collect());
        machine.globals.push(machine.memory.len() - 1);
    }
    let outcome = match machine.call(entry, Vec::new())? {
        Flow::Return(Value::Int(code)) => Outcome::Returned(code),
        Flow::Return(other) => return Err(format!("entry returned non-int {other:?}")),
        Flow::Halt(message) => Outcome::Halted(message),
    };
    Ok(Run {
        outcome,
        output: machine.output,
    })
}

fn flatten(value: &Const, cells: &mut Vec<Value>) {
    match value {
        Const::Int(n) => cells.push(Value::Int(*n)),
        Const::Bool(b) => cells.push(Value::Bool(*b)),
        Const::Null => cells.push(Value::Null),
        Const::ProcRef(p) => cells.push(Value::Proc(*p)),
        Const::Struct { values, .. } => values.iter().for_each(|v| flatten(v, cells)),
    }
}

impl Machine<'_> {
    fn call(&mut self, id: ProcId, args: Vec<Value>) -> Result<Flow, String> {
        let proc = self.prog.proc(id);
        if !proc.is_defined() {
            return Err(format!("call to undefined procedure {}", proc.name));
        }
        if args.len() != proc.params.len() {
            return Err(format!(
                "{} expects {} arguments, got {}",
                proc.name,
                proc.params.len(),
                args.len()
            ));
        }
        let mut vars: Vec<Option<Value>> = vec![None; proc.var_types.len()];
        for (param, arg) in proc.params.iter().zip(args) {
            vars[param.var.index()] = Some(arg);
        }

        let mut block = proc.entry();
        loop {
            let bb = proc.block(block);
            for instr in &bb.body {
                self.fuel = self
                    .fuel
                    .checked_sub(1)
                    .ok_or_else(|| "out of fuel".to_owned())?;
                if let Some(message) = self.step(instr, &mut vars)? {
                    return Ok(Flow::Halt(message));
                }
            }
            match &bb.terminator {
                Terminator::Jump { target } => block = *target,
                Terminator::Branch {
                    cond,
                    then_block,
                    else_block,
                } => {
                    block = match self.eval(cond, &vars)? {
                        Value::Bool(true) => *then_block,
                        Value::Bool(false) => *else_block,
                        other => return Err(format!("branch on {other:?}")),
                    }
                }
                Terminator::Return { value } => return Ok(Flow::Return(self.eval(value, &vars)?)),
                Terminator::HaltWithError { message } => return Ok(Flow::Halt(message.clone())),
            }
        }
    }

    /// Execute one instruction. `Some` carries the message of a callee that halted.
    fn step(
        &mut self,
        instr: &Instr,
        vars: &mut [Option<Value>],
    ) -> Result<Option<String>, String> {
        let (dst, value) = match instr {
            Instr::Alloca { dst, .. } => {
                self.memory.push(vec![None]);
                (*dst, self.fresh_pointer())
            }
            Instr::Alloc { dst, size } => {
                let Value::Int(size) = self.eval(size, vars)? else {
                    return Err("alloc size is not an int".to_owned());
                };
                if size < 0 {
                    return Err(format!("alloc of negative size {size}"));
                }
                self.memory.push(Vec::new());
                (*dst, self.fresh_pointer())
            }
            Instr::Load { dst, address } => {
                let (alloc, offset) = self.pointer(address, vars)?;
                let value = self.memory[alloc]
                    .get(offset)
                    .cloned()
                    .flatten()
                    .ok_or_else(|| format!("read of uninitialized cell {alloc}:{offset}"))?;
                (*dst, value)
            }
            Instr::Store { address, value } => {
                let (alloc, offset) = self.pointer(address, vars)?;
                let value = self.eval(value, vars)?;
                let cells = &mut self.memory[alloc];
                if cells.len() <= offset {
                    cells.resize(offset + 1, None);
                }
                cells[offset] = Some(value);
                return Ok(None);
            }
            Instr::GetElementPtr { dst, base, indices } => {
                let (alloc, offset) = self.pointer(base, vars)?;
                let mut steps = Vec::with_capacity(indices.len());
                for index in indices {
                    match self.eval(index, vars)? {
                        Value::Int(i) => steps.push(i),
                        other => return Err(format!("non-int gep index {other:?}")),
                    }
                }
                if steps.first() != Some(&0) {
                    return Err(format!("unsupported leading gep index {steps:?}"));
                }
                let delta: i64 = steps[1..].iter().map(|&i| i64::from(i)).sum();
                let offset = i64::try_from(offset).map_err(|e| e.to_string())? + delta;
                let offset =
                    usize::try_from(offset).map_err(|_| format!("negative address {offset}"))?;
                (*dst, Value::Ptr { alloc, offset })
            }
            Instr::BinaryOp {
                dst,
                left,
                op,
                right,
            } => {
                let l = self.eval(left, vars)?;
                let r = self.eval(right, vars)?;
                (*dst, binary(*op, l, r)?)
            }
            Instr::Bitcast { dst, value } => (*dst, self.eval(value, vars)?),
            Instr::Call {
                dst,
                function,
                args,
            } => {
                let target = match self.eval(function, vars)? {
                    Value::Proc(p) => p,
                    other => return Err(format!("call through {other:?}")),
                };
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg, vars)?);
                }
                match self.call(target, values)? {
                    Flow::Return(value) => (*dst, value),
                    Flow::Halt(message) => return Ok(Some(message)),
                }
            }
            Instr::Print { value } => {
                match self.eval(value, vars)? {
                    Value::Int(n) => self.output.push(n),
                    other => return Err(format!("print of {other:?}")),
                }
                return Ok(None);
            }
            Instr::Comment { .. } => return Ok(None),
        };
        vars[dst.index()] = Some(value);
        Ok(None)
    }

    fn fresh_pointer(&self) -> Value {
        Value::Ptr {
            alloc: self.memory.len() - 1,
            offset: 0,
        }
    }

    fn pointer(&self, operand: &Operand, vars: &[Option<Value>]) -> Result<(usize, usize), String> {
        match self.eval(operand, vars)? {
            Value::Ptr { alloc, offset } => Ok((alloc, offset)),
            other => Err(format!("dereference of {other:?}")),
        }
    }

    fn eval(&self, operand: &Operand, vars: &[Option<Value>]) -> Result<Value, String> {
        Ok(match operand {
            Operand::Var(v) => vars[v.index()]
                .clone()
                .ok_or_else(|| format!("use of undefined {v:?}"))?,
            Operand::ConstInt(n) => Value::Int(*n),
            Operand::ConstBool(b) => Value::Bool(*b),
            Operand::Null => Value::Null,
            Operand::ProcRef(p) => Value::Proc(*p),
            Operand::GlobalRef(g) => Value::Ptr {
                alloc: self.globals[g.index()],
                offset: 0,
            },
            Operand::Sizeof(id) => Value::Int(
                self.prog
                    .struct_size(*id)
                    .and_then(|s| i32::try_from(s).ok())
                    .ok_or_else(|| format!("unsized struct {id:?}"))?,
            ),
        })
    }
}

fn binary(op: BinOp, l: Value, r: Value) -> Result<Value, String> {
    Ok(match (op, l, r) {
        (BinOp::Add, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_add(b)),
        (BinOp::Sub, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_sub(b)),
        (BinOp::Mul, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_mul(b)),
        (BinOp::Sdiv, Value::Int(a), Value::Int(b)) => {
            Value::Int(a.checked_div(b).ok_or_else(|| format!("unchecked division {a} / {b}"))?)
        }
        (BinOp::Slt, Value::Int(a), Value::Int(b)) => Value::Bool(a < b),
        (BinOp::And, Value::Bool(a), Value::Bool(b)) => Value::Bool(a && b),
        (BinOp::Or, Value::Bool(a), Value::Bool(b)) => Value::Bool(a || b),
        (BinOp::Eq, a, b) => Value::Bool(a == b),
        (op, a, b) => return Err(format!("ill-typed {op:?} on {a:?}, {b:?}")),
    })
}
