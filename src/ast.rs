// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::lexer::*;
use crate::value::Value;
use crate::*;

use core::{cmp, fmt, ops::Deref};

pub struct NodeRef<T> {
    r: Rc<T>,
}

impl<T> Clone for NodeRef<T> {
    fn clone(&self) -> Self {
        Self { r: self.r.clone() }
    }
}

impl<T: fmt::Debug> fmt::Debug for NodeRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.r.as_ref().fmt(f)
    }
}

impl<T> cmp::PartialEq for NodeRef<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::as_ptr(&self.r).eq(&Rc::as_ptr(&other.r))
    }
}

impl<T> cmp::Eq for NodeRef<T> {}

impl<T> Deref for NodeRef<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.r
    }
}

impl<T> AsRef<T> for NodeRef<T> {
    fn as_ref(&self) -> &T {
        self.deref()
    }
}

impl<T> NodeRef<T> {
    pub fn new(t: T) -> Self {
        Self { r: Rc::new(t) }
    }
}

pub type Ref<T> = NodeRef<T>;

/// Expression nodes of a template output block.
///
/// The set of kinds is closed; visitors match on it exhaustively.
#[derive(Debug)]
pub enum Expr {
    // Variable lookup.
    Name {
        span: Span,
        name: Rc<str>,
    },

    // String, number, boolean or none literal.
    Const {
        span: Span,
        value: Value,
    },

    List {
        span: Span,
        items: Vec<Ref<Expr>>,
    },

    Tuple {
        span: Span,
        items: Vec<Ref<Expr>>,
    },

    // node.attr
    Getattr {
        span: Span,
        node: Ref<Expr>,
        attr: (Span, Rc<str>),
    },

    // node[index]
    Getitem {
        span: Span,
        node: Ref<Expr>,
        index: Ref<Expr>,
    },

    // node|name(args, kwargs)
    Filter {
        span: Span,
        node: Ref<Expr>,
        name: Span,
        args: Vec<Ref<Expr>>,
        kwargs: Vec<(Span, Ref<Expr>)>,
    },
}

impl Expr {
    pub const fn span(&self) -> &Span {
        match *self {
            Self::Name { ref span, .. }
            | Self::Const { ref span, .. }
            | Self::List { ref span, .. }
            | Self::Tuple { ref span, .. }
            | Self::Getattr { ref span, .. }
            | Self::Getitem { ref span, .. }
            | Self::Filter { ref span, .. } => span,
        }
    }

    /// 1-based line the node is attributed to in diagnostics.
    ///
    /// A filter application belongs to the line of its name, so a chain
    /// broken over several lines reports the offending filter.
    pub const fn line(&self) -> u32 {
        match *self {
            Self::Filter { ref name, .. } => name.line,
            _ => self.span().line,
        }
    }

    pub const fn kind_name(&self) -> &'static str {
        match *self {
            Self::Name { .. } => "Name",
            Self::Const { .. } => "Const",
            Self::List { .. } => "List",
            Self::Tuple { .. } => "Tuple",
            Self::Getattr { .. } => "Getattr",
            Self::Getitem { .. } => "Getitem",
            Self::Filter { .. } => "Filter",
        }
    }

    /// The literal value when the node is a constant.
    pub fn as_const(&self) -> Option<&Value> {
        match self {
            Self::Const { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// A parsed template: the expressions of every `{{ ... }}` block in
/// document order.
#[derive(Debug)]
pub struct Template {
    pub source: Source,
    pub outputs: Vec<Ref<Expr>>,
}
