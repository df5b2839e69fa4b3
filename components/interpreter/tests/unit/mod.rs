//! Unit test entry point for interpreter

mod test_continuations;
mod test_errors;
mod test_loops;

use bytecode_system::{asm, TranslationUnit};
use interpreter::Vm;
use memory_manager::ObjectPtr;

/// Assembles `text` and evaluates it in the current scope.
pub(crate) fn eval(vm: &mut Vm, text: &str) -> Result<(), interpreter::VmError> {
    let unit = TranslationUnit::from_methods(asm::assemble(text).expect("assembles"));
    vm.eval(unit);
    vm.run()
}

/// Assembles a single body into a host method bound as `name` on the
/// global object.
pub(crate) fn define(vm: &mut Vm, name: &str, text: &str) -> ObjectPtr {
    let body = asm::assemble(text).expect("assembles").remove(0);
    let method = vm.define_method(body).expect("valid body");
    let sym = vm.intern(name);
    vm.global().put(sym, method.clone()).expect("unprotected");
    method
}

/// Stores `$1` in `global.<name>`.
pub(crate) fn store_arg_body(name: &str) -> String {
    format!(
        "GETD %slf\nSYM \"$1\"\nRTRV\nPUSH %ret %sto\n\
         GETL %slf\nSYM \"global\"\nRTRV\nMOV %ret %slf\n\
         SYM \"{}\"\nPOP %ptr %sto\nSETF\n",
        name
    )
}
