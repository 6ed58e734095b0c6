use std::mem::MaybeUninit;
use std::ptr;

/// Raw link between tree cells. Null means "no child"; the header sentinel is
/// reachable only through parent links and `Tree`'s own handle.
pub(super) type NodePtr<V> = *mut Node<V>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(super) enum Color {
    Red,
    Black,
}

// We use MaybeUninit so the header sentinel can share the node layout
// without ever holding a value.
pub(super) struct Node<V> {
    pub(super) parent: NodePtr<V>,
    pub(super) left: NodePtr<V>,
    pub(super) right: NodePtr<V>,
    pub(super) color: Color,
    pub(super) value: MaybeUninit<V>,
}

impl<V> Node<V> {
    /// Allocates a fresh red leaf carrying `value`, with all links null.
    pub(super) fn alloc(value: V) -> NodePtr<V> {
        Box::into_raw(Box::new(Node {
            parent: ptr::null_mut(),
            left: ptr::null_mut(),
            right: ptr::null_mut(),
            color: Color::Red,
            value: MaybeUninit::new(value),
        }))
    }

    /// Frees a value-bearing node, dropping its value.
    ///
    /// # Safety
    /// `node` must have come from `alloc` (value slot live) and must not be
    /// reachable from any tree afterward.
    pub(super) unsafe fn dealloc(node: NodePtr<V>) {
        (*node).value.assume_init_drop();
        drop(Box::from_raw(node));
    }

    /// Frees a node after its value has been read out.
    ///
    /// # Safety
    /// Same as `dealloc`, except the value slot is already vacated.
    pub(super) unsafe fn dealloc_empty(node: NodePtr<V>) {
        drop(Box::from_raw(node));
    }

    /// Leftmost descendant of `x`.
    ///
    /// # Safety
    /// `x` must be a valid, non-null node in a well-formed subtree.
    pub(super) unsafe fn minimum(mut x: NodePtr<V>) -> NodePtr<V> {
        while !(*x).left.is_null() {
            x = (*x).left;
        }
        x
    }

    /// Rightmost descendant of `x`.
    ///
    /// # Safety
    /// `x` must be a valid, non-null node in a well-formed subtree.
    pub(super) unsafe fn maximum(mut x: NodePtr<V>) -> NodePtr<V> {
        while !(*x).right.is_null() {
            x = (*x).right;
        }
        x
    }
}

pub(super) fn is_red<V>(x: NodePtr<V>) -> bool {
    // Null links count as black.
    !x.is_null() && unsafe { (*x).color } == Color::Red
}

pub(super) fn is_black<V>(x: NodePtr<V>) -> bool {
    !is_red(x)
}

/// In-order successor. Applied to the maximum it yields the header, which is
/// the canonical end position.
///
/// # Safety
/// `x` must be a valid node inside a tree whose root's parent is the header.
pub(super) unsafe fn successor<V>(mut x: NodePtr<V>) -> NodePtr<V> {
    if !(*x).right.is_null() {
        x = (*x).right;
        while !(*x).left.is_null() {
            x = (*x).left;
        }
    } else {
        let mut y = (*x).parent;
        while x == (*y).right {
            x = y;
            y = (*y).parent;
        }
        // When the maximum is the root the climb overshoots onto the
        // header; the header is already the correct answer then.
        if (*x).right != y {
            x = y;
        }
    }
    x
}

/// In-order predecessor. Applied to the header (end) it yields the cached
/// maximum in O(1): the header is the only red node whose grandparent link
/// loops back onto itself.
///
/// # Safety
/// `x` must be a valid node or the header of a non-empty tree.
pub(super) unsafe fn predecessor<V>(mut x: NodePtr<V>) -> NodePtr<V> {
    if (*x).color == Color::Red && (*(*x).parent).parent == x {
        x = (*x).right;
    } else if !(*x).left.is_null() {
        x = (*x).left;
        while !(*x).right.is_null() {
            x = (*x).right;
        }
    } else {
        let mut y = (*x).parent;
        while x == (*y).left {
            x = y;
            y = (*y).parent;
        }
        x = y;
    }
    x
}
