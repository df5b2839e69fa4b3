//! Register dumps for fatal-fault diagnostics

use serde::Serialize;

use memory_manager::ObjectPtr;

use crate::persistent::PList;
use crate::vm::Vm;

/// A serializable picture of every register.
///
/// Objects appear by heap address; stacks are listed top first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateDump {
    /// `%ptr`
    pub ptr: Option<String>,
    /// `%slf`
    pub slf: Option<String>,
    /// `%ret`
    pub ret: Option<String>,
    /// Lexical scopes
    pub lex: Vec<String>,
    /// Dynamic scopes
    #[serde(rename = "dyn")]
    pub dyn_: Vec<String>,
    /// Pending arguments
    pub arg: Vec<String>,
    /// Scratch storage
    pub sto: Vec<String>,
    /// Installed handlers
    pub hand: Vec<String>,
    /// Error flag
    pub err0: bool,
    /// Secondary error flag
    pub err1: bool,
    /// Name of `%sym`
    pub sym: String,
    /// Text of `%num0`
    pub num0: String,
    /// Text of `%num1`
    pub num1: String,
    /// `%str0`
    pub str0: String,
    /// `%str1`
    pub str1: String,
    /// `%flag`
    pub flag: bool,
    /// Current cursor
    pub cursor: CursorDump,
    /// Saved cursors
    pub call_depth: usize,
    /// Active wind frames
    pub wind_depth: usize,
    /// Unit markers
    pub unit_depth: usize,
    /// Current location, then the backtrace
    pub trace: Vec<String>,
    /// Live heap objects
    pub live_objects: usize,
    /// Instructions executed
    pub steps: u64,
}

/// Where the current cursor is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CursorDump {
    /// Next instruction
    pub position: usize,
    /// Body length
    pub length: usize,
    /// Method index, if the cursor came from one
    pub method: Option<String>,
}

fn name(obj: &ObjectPtr) -> String {
    obj.id().to_string()
}

fn names(stack: &PList<ObjectPtr>) -> Vec<String> {
    stack.iter().map(name).collect()
}

impl StateDump {
    pub(crate) fn capture(vm: &Vm) -> Self {
        let state = &vm.state;
        let trans = &vm.trans;
        let mut trace = vec![format!("{}:{}", state.file, state.line)];
        trace.extend(state.trace.iter().map(|f| f.to_string()));
        StateDump {
            ptr: trans.ptr.as_ref().map(name),
            slf: trans.slf.as_ref().map(name),
            ret: trans.ret.as_ref().map(name),
            lex: names(&state.lex),
            dyn_: names(&state.dyn_),
            arg: names(&state.arg),
            sto: names(&state.sto),
            hand: names(&state.hand),
            err0: trans.err0,
            err1: trans.err1,
            sym: vm.symbols.name(trans.sym),
            num0: trans.num0.to_string(),
            num1: trans.num1.to_string(),
            str0: trans.str0.clone(),
            str1: trans.str1.clone(),
            flag: trans.flag,
            cursor: CursorDump {
                position: state.cont.position(),
                length: state.cont.len(),
                method: state.cont.method().map(|m| m.index().to_string()),
            },
            call_depth: state.stack.len(),
            wind_depth: state.wind.len(),
            unit_depth: state.trns.len(),
            trace,
            live_objects: vm.heap.live_count(),
            steps: vm.steps,
        }
    }
}
