//! Operand provenance over a flat instruction sequence.
//!
//! Given a consuming instruction and one of its operands, walks backward
//! through the preceding instructions keeping a running count of stack values
//! still owed, and reports the instruction (or contiguous slice of
//! instructions) that leaves that operand on the stack:
//!
//! ```text
//! 0: i32.const 4   ┐
//! 1: i32.const 8   │ Range { first: 0, last: 2 }
//! 2: i32.add       ┘
//! 3: i32.store     <- consumer
//! ```
//!
//! Structured instructions are treated as a unit, pulling their block
//! parameters and pushing their block results. This is a best-effort walk,
//! not validation: anything it cannot account for yields `None`.

use log::trace;

use crate::parser::instruction::{BlockType, Computed, Instruction, StackSpec};
use crate::parser::module::{FuncId, Module};

/// The instructions that produce an operand, by position in the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// A single instruction with no operands of its own.
    Single(usize),
    /// `last` pushes the value; `first..=last` also produces everything
    /// `last` pulls.
    Range { first: usize, last: usize },
}

impl Provenance {
    pub fn first(&self) -> usize {
        match *self {
            Provenance::Single(i) => i,
            Provenance::Range { first, .. } => first,
        }
    }

    pub fn last(&self) -> usize {
        match *self {
            Provenance::Single(i) => i,
            Provenance::Range { last, .. } => last,
        }
    }
}

/// Resolves the stack arity of instructions whose effect depends on the
/// module (calls, typed blocks, tags).
#[derive(Debug, Clone, Copy)]
pub struct StackContext<'m> {
    module: &'m Module,
}

impl<'m> StackContext<'m> {
    pub fn new(module: &'m Module) -> StackContext<'m> {
        StackContext { module }
    }

    /// Number of values `instr` pops, or `None` if it can't be determined.
    pub fn operand_count(&self, instr: &Instruction) -> Option<usize> {
        self.arity(&instr.opcode().descriptor().pull, instr)
    }

    /// Number of values `instr` pushes, or `None` if it can't be determined.
    pub fn result_count(&self, instr: &Instruction) -> Option<usize> {
        self.arity(&instr.opcode().descriptor().push, instr)
    }

    fn arity(&self, spec: &StackSpec, instr: &Instruction) -> Option<usize> {
        match spec {
            StackSpec::Computed(computed) => self.resolve(*computed, instr),
            fixed => fixed.fixed_arity(),
        }
    }

    fn resolve(&self, computed: Computed, instr: &Instruction) -> Option<usize> {
        match computed {
            Computed::BlockParams => self.block_arity(instr).map(|(params, _)| params),
            Computed::BlockResults => self.block_arity(instr).map(|(_, results)| results),
            Computed::IfParams => self.block_arity(instr).map(|(params, _)| params + 1),
            Computed::TagParams => match instr {
                Instruction::Throw { tag } => {
                    let tag = self.module.tags.get(*tag)?;
                    self.module.types.get(tag.type_id).map(|ft| ft.params.len())
                }
                _ => None,
            },
            Computed::CallParams | Computed::CallResults => {
                let ft = match instr {
                    Instruction::Call { func } | Instruction::ReturnCall { func } => self.module.func_type(*func)?,
                    _ => return None,
                };
                Some(if computed == Computed::CallParams { ft.params.len() } else { ft.results.len() })
            }
            Computed::CallIndirectParams | Computed::CallIndirectResults => {
                let ft = match instr {
                    Instruction::CallIndirect { type_id, .. } | Instruction::ReturnCallIndirect { type_id, .. } => {
                        self.module.types.get(*type_id)?
                    }
                    _ => return None,
                };
                Some(if computed == Computed::CallIndirectParams { ft.params.len() + 1 } else { ft.results.len() })
            }
            Computed::Operand
            | Computed::SelectResult
            | Computed::LocalType
            | Computed::GlobalType
            | Computed::TableElem
            | Computed::RefNullType => Some(1),
            Computed::TableSet | Computed::TableGrow => Some(2),
            Computed::Select | Computed::TableFill => Some(3),
        }
    }

    fn block_arity(&self, instr: &Instruction) -> Option<(usize, usize)> {
        let block_type = match instr {
            Instruction::Block { block_type, .. }
            | Instruction::Loop { block_type, .. }
            | Instruction::If { block_type, .. }
            | Instruction::Try { block_type, .. } => block_type,
            _ => return None,
        };
        match block_type {
            BlockType::Empty => Some((0, 0)),
            BlockType::Value(_) => Some((0, 1)),
            BlockType::Type(id) => self.module.types.get(*id).map(|ft| (ft.params.len(), ft.results.len())),
        }
    }

    /// `(pulls, pushes)` for an instruction the walk may step over.
    fn effect(&self, instr: &Instruction) -> Option<(usize, usize)> {
        if instr.opcode().is_stack_polymorphic() {
            return None;
        }
        Some((self.operand_count(instr)?, self.result_count(instr)?))
    }
}

/// Outcome of walking back to one stack slot.
enum Walk {
    Found(Provenance),
    /// The sequence starts before the slot was reached.
    Exhausted,
    Unknown,
}

/// Finds the instructions producing operand `operand` of
/// `instructions[consumer]`. Operands are numbered in reverse declaration
/// order: 0 is the value about to be consumed (the top of the stack), so for
/// `i32.store` operand 0 is the value and operand 1 the address.
///
/// A fragment that begins mid-stack may supply fewer values than the consumer
/// pulls. Operands below the start of the sequence then resolve to the
/// deepest value the sequence does push.
pub fn find_producer(
    instructions: &[Instruction],
    consumer: usize,
    operand: usize,
    ctx: &StackContext,
) -> Option<Provenance> {
    let consumed = ctx.operand_count(instructions.get(consumer)?)?;
    if operand >= consumed {
        return None;
    }

    for depth in (0..=operand).rev() {
        match walk_to_slot(instructions, consumer, depth, ctx) {
            Walk::Found(provenance) => {
                trace!("operand {operand} of instruction {consumer} comes from {provenance:?}");
                return Some(provenance);
            }
            Walk::Exhausted => continue,
            Walk::Unknown => return None,
        }
    }
    None
}

/// Walks back from `consumer` to the producer of the value `depth` slots
/// below the top of the stack.
fn walk_to_slot(instructions: &[Instruction], consumer: usize, depth: usize, ctx: &StackContext) -> Walk {
    // Values that must still be pushed, counting down from the top of the
    // stack, before the slot itself is reached.
    let mut owed = depth + 1;
    let mut index = consumer;
    let last = loop {
        let Some(prev) = index.checked_sub(1) else {
            return Walk::Exhausted;
        };
        index = prev;
        let Some((pulls, pushes)) = ctx.effect(&instructions[index]) else {
            return Walk::Unknown;
        };
        if pushes >= owed {
            break index;
        }
        owed = owed - pushes + pulls;
    };

    let Some((mut owed, _)) = ctx.effect(&instructions[last]) else {
        return Walk::Unknown;
    };
    if owed == 0 {
        return Walk::Found(Provenance::Single(last));
    }

    let mut first = last;
    while owed > 0 {
        let Some(prev) = first.checked_sub(1) else {
            return Walk::Unknown;
        };
        first = prev;
        let Some((pulls, pushes)) = ctx.effect(&instructions[first]) else {
            return Walk::Unknown;
        };
        if pushes > owed {
            return Walk::Unknown;
        }
        owed = owed - pushes + pulls;
    }
    Walk::Found(Provenance::Range { first, last })
}

/// Finds the address operand of a load or store at `instructions[consumer]`.
/// The address is declared first, so it is the deepest operand the access
/// pulls.
pub fn find_memory_address(instructions: &[Instruction], consumer: usize, ctx: &StackContext) -> Option<Provenance> {
    let access = instructions.get(consumer)?;
    if !access.opcode().has_memarg() {
        return None;
    }
    let pulled = ctx.operand_count(access)?;
    find_producer(instructions, consumer, pulled.checked_sub(1)?, ctx)
}

impl Module {
    /// [`find_producer`] over the top level of a defined function's body.
    pub fn find_producer(&self, func: FuncId, consumer: usize, operand: usize) -> Option<Provenance> {
        let body = self.functions.get(func)?.body()?;
        find_producer(&body.instructions, consumer, operand, &StackContext::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::instruction::{LocalId, MemArg, Opcode};
    use crate::parser::types::ValueType;
    use rstest::rstest;

    fn i32_const(value: i32) -> Instruction {
        Instruction::I32Const { value }
    }

    fn local_get(index: u32) -> Instruction {
        Instruction::LocalGet { local: LocalId(index) }
    }

    fn store() -> Instruction {
        Instruction::memory(Opcode::I32Store, MemArg::natural(Opcode::I32Store))
    }

    #[test]
    fn test_addition_subexpression() {
        let module = Module::new();
        let ctx = StackContext::new(&module);
        let instrs = vec![i32_const(4), i32_const(8), Instruction::plain(Opcode::I32Add), store()];
        let addition = Some(Provenance::Range { first: 0, last: 2 });
        assert_eq!(find_memory_address(&instrs, 3, &ctx), addition);
        assert_eq!(find_producer(&instrs, 3, 1, &ctx), addition);
        assert_eq!(find_producer(&instrs, 3, 0, &ctx), addition);
    }

    #[rstest]
    #[case(0, Some(Provenance::Range { first: 1, last: 3 }))]
    #[case(1, Some(Provenance::Single(0)))]
    fn test_store_operands(#[case] operand: usize, #[case] expected: Option<Provenance>) {
        let module = Module::new();
        let ctx = StackContext::new(&module);
        let instrs = vec![local_get(0), local_get(1), i32_const(1), Instruction::plain(Opcode::I32Add), store()];
        assert_eq!(find_producer(&instrs, 4, operand, &ctx), expected);
    }

    #[test]
    fn test_store_address_is_deepest_operand() {
        let module = Module::new();
        let ctx = StackContext::new(&module);
        let instrs = vec![i32_const(100), i32_const(4), i32_const(8), Instruction::plain(Opcode::I32Add), store()];
        assert_eq!(find_memory_address(&instrs, 4, &ctx), Some(Provenance::Single(0)));
        assert_eq!(find_producer(&instrs, 4, 0, &ctx), Some(Provenance::Range { first: 1, last: 3 }));
    }

    #[test]
    fn test_memory_address() {
        let module = Module::new();
        let ctx = StackContext::new(&module);
        let load = Instruction::memory(Opcode::I32Load, MemArg::natural(Opcode::I32Load));
        let instrs = vec![local_get(0), i32_const(16), Instruction::plain(Opcode::I32Add), load.clone()];
        assert_eq!(find_memory_address(&instrs, 3, &ctx), Some(Provenance::Range { first: 0, last: 2 }));
        // not a memory access
        assert_eq!(find_memory_address(&instrs, 2, &ctx), None);
    }

    #[test]
    fn test_steps_over_side_effects() {
        let module = Module::new();
        let ctx = StackContext::new(&module);
        let instrs = vec![
            i32_const(1),
            i32_const(2),
            Instruction::LocalSet { local: LocalId(0) },
            i32_const(3),
            Instruction::plain(Opcode::I32Add),
        ];
        assert_eq!(find_producer(&instrs, 4, 0, &ctx), Some(Provenance::Single(3)));
        assert_eq!(find_producer(&instrs, 4, 1, &ctx), Some(Provenance::Single(0)));
    }

    #[test]
    fn test_tee_is_ordinary() {
        let module = Module::new();
        let ctx = StackContext::new(&module);
        let instrs = vec![i32_const(7), Instruction::LocalTee { local: LocalId(0) }, Instruction::plain(Opcode::Drop)];
        assert_eq!(find_producer(&instrs, 2, 0, &ctx), Some(Provenance::Range { first: 0, last: 1 }));
    }

    #[test]
    fn test_call_uses_signature() {
        let mut module = Module::new();
        let ty = module.get_or_create_type(&[ValueType::I32, ValueType::I32], &[ValueType::I32]);
        let func = module.add_defined_function(ty, &[], vec![]).unwrap();
        let ctx = StackContext::new(&module);
        let instrs = vec![i32_const(1), i32_const(2), Instruction::Call { func }, Instruction::plain(Opcode::Drop)];
        assert_eq!(ctx.operand_count(&instrs[2]), Some(2));
        assert_eq!(find_producer(&instrs, 3, 0, &ctx), Some(Provenance::Range { first: 0, last: 2 }));
    }

    #[test]
    fn test_block_is_a_unit() {
        let module = Module::new();
        let ctx = StackContext::new(&module);
        let block = Instruction::Block { block_type: BlockType::Value(ValueType::I32), body: vec![i32_const(5)] };
        let instrs = vec![block, Instruction::plain(Opcode::Drop)];
        assert_eq!(find_producer(&instrs, 1, 0, &ctx), Some(Provenance::Single(0)));
    }

    #[rstest]
    #[case::runs_off_start(vec![Instruction::plain(Opcode::I32Add), store()], 1, 1)]
    #[case::polymorphic(vec![Instruction::Br { depth: 0 }, Instruction::plain(Opcode::Drop)], 1, 0)]
    #[case::operand_out_of_range(vec![i32_const(1), Instruction::plain(Opcode::Drop)], 1, 1)]
    #[case::consumer_out_of_range(vec![i32_const(1)], 5, 0)]
    fn test_not_found(#[case] instrs: Vec<Instruction>, #[case] consumer: usize, #[case] operand: usize) {
        let module = Module::new();
        assert_eq!(find_producer(&instrs, consumer, operand, &StackContext::new(&module)), None);
    }

    #[test]
    fn test_module_find_producer() {
        let mut module = Module::new();
        let ty = module.get_or_create_type(&[ValueType::I32], &[]);
        let body = vec![local_get(0), Instruction::plain(Opcode::Drop)];
        let func = module.add_defined_function(ty, &[], body).unwrap();
        assert_eq!(module.find_producer(func, 1, 0), Some(Provenance::Single(0)));
    }
}
