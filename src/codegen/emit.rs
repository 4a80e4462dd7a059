//! Statement emission for the body of `compute(row)`.

use super::literal::py_quote;
use super::writer::CodeWriter;
use crate::ir::{Stmt, WhileLoop};

pub(super) const RESULTS: &str = "results";
pub(super) const VARS: &str = "_vars";

pub(super) fn emit_stmts(w: &mut CodeWriter, stmts: &[Stmt]) {
    for stmt in stmts {
        emit_stmt(w, stmt);
    }
}

fn emit_stmt(w: &mut CodeWriter, stmt: &Stmt) {
    match stmt {
        Stmt::Assign { target, value } => w.line(&format!("{} = {}", target, value)),
        Stmt::Store { label, value } => {
            w.line(&format!("{}[{}] = {}", RESULTS, py_quote(label), value))
        }
        Stmt::Loop(l) => emit_loop(w, l),
    }
}

fn emit_loop(w: &mut CodeWriter, l: &WhileLoop) {
    let i = &l.counter;
    w.line(&format!("{} = 0", i));
    w.line(&format!("{} = None", l.last));
    w.block_open(&format!(
        "while (bool({})) and {} < int({})",
        l.cond.inline(),
        i,
        l.max.inline()
    ));

    for aux in &l.aux {
        w.line(&format!("_ = {}", aux));
    }
    emit_stmts(w, &l.body);

    if let Some(cont) = &l.cont {
        w.block_open(&format!("if bool({})", cont.inline()));
        w.line(&format!("{} += 1", i));
        w.line("continue");
        w.block_close();
    }
    if let Some(brk) = &l.brk {
        w.block_open(&format!("if bool({})", brk.inline()));
        w.line("break");
        w.block_close();
    }

    w.line(&format!("{} = {}", l.iter, l.value));
    w.block_open(&format!("if {} is not None", l.iter));
    w.line(&format!("{} = {}", l.last, l.iter));
    w.block_close();
    w.line(&format!("{} += 1", i));
    w.block_close();
}
