//! Enlazado de grupos de aplicación.
//!
//! Los pines pueden declarar una etiqueta `group` que los asocia entre
//! sí sin importar el tipo de grupo estructural al que pertenezcan. El
//! firmware recorre estas asociaciones como listas simplemente enlazadas
//! que se construyen por inserción al frente: el pin declarado más
//! recientemente con una etiqueta es la cabeza exportada de la lista y
//! su campo de enlace apunta al pin anterior con la misma etiqueta.
//!
//! Las listas se representan como una arena de nodos indexados. Cada
//! etiqueta mapea al índice de su nodo más reciente.

use crate::ir::PinPath;
use std::{collections::HashMap, iter};

/// Estado de enlazado de un dispositivo.
#[derive(Debug, Default)]
pub struct GroupLinker {
    nodes: Vec<Node>,
    heads: Vec<Head>,
    by_tag: HashMap<String, usize>,
}

#[derive(Debug)]
struct Node {
    pin: PinPath,
    next: Option<usize>,
}

/// Cabeza de una lista, en orden de primera aparición de su etiqueta.
#[derive(Debug)]
struct Head {
    tag: String,
    node: usize,
}

/// Resultado de enlazar un pin.
#[derive(Debug, PartialEq, Eq)]
pub struct Linked<'a> {
    /// Pin anterior con la misma etiqueta, si existe.
    pub next: Option<&'a PinPath>,

    /// Indica si esta es la primera aparición de la etiqueta.
    pub first: bool,
}

impl GroupLinker {
    /// Inserta un pin al frente de la lista de su etiqueta.
    pub fn link(&mut self, tag: &str, pin: PinPath) -> Linked<'_> {
        let node = self.nodes.len();

        let (next, first) = match self.by_tag.get(tag).copied() {
            Some(index) => {
                let head = &mut self.heads[index];
                let previous = head.node;
                head.node = node;

                (Some(previous), false)
            }

            None => {
                self.by_tag.insert(tag.to_owned(), self.heads.len());
                self.heads.push(Head {
                    tag: tag.to_owned(),
                    node,
                });

                (None, true)
            }
        };

        self.nodes.push(Node { pin, next });

        Linked {
            next: next.map(|index| &self.nodes[index].pin),
            first,
        }
    }

    /// Cabezas finales de todas las etiquetas, en orden de primera aparición.
    pub fn heads(&self) -> impl Iterator<Item = (&str, &PinPath)> + '_ {
        self.heads
            .iter()
            .map(move |head| (head.tag.as_str(), &self.nodes[head.node].pin))
    }

    /// Recorre los miembros de una etiqueta desde su cabeza.
    ///
    /// El orden de recorrido es el inverso al de declaración.
    pub fn members<'a>(&'a self, tag: &str) -> impl Iterator<Item = &'a PinPath> + 'a {
        let head = self
            .by_tag
            .get(tag)
            .map(|&index| self.heads[index].node);

        iter::successors(head, move |&index| self.nodes[index].next)
            .map(move |index| &self.nodes[index].pin)
    }

    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }
}
