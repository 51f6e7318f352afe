use std::ops::{Index, IndexMut};

use crate::ast::{ast::DeclId, declarations::Decl};

/// Owns every registered declaration. Expressions refer into it by id.
#[derive(Debug, Default)]
pub struct DeclArena {
    decls: Vec<Decl>,
}

impl DeclArena {
    pub fn alloc(&mut self, decl: Decl) -> DeclId {
        self.decls.push(decl);
        DeclId(self.decls.len() - 1)
    }
}

impl Index<DeclId> for DeclArena {
    type Output = Decl;

    fn index(&self, id: DeclId) -> &Decl {
        &self.decls[id.0]
    }
}

impl IndexMut<DeclId> for DeclArena {
    fn index_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id.0]
    }
}
