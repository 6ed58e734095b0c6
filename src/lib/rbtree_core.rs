use std::marker::PhantomData;
use std::mem;
use std::ptr;

use compare::Compare;

use crate::rbtree_iter::{IntoIter, Iter, IterMut};
use crate::rbtree_key::KeyOf;
use crate::rbtree_node::{is_black, is_red, predecessor, successor, Color, Node, NodePtr};

/// One step of the insert fixup walk, classified from the colors around the
/// freshly linked red node.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum InsertCase {
    /// Uncle red: recolor parent/uncle black and grandparent red, continue
    /// the walk from the grandparent.
    FlipColors,
    /// Uncle black, node is the inner (zig-zag) child: pre-rotate at the
    /// parent, then fall into the outer rotation.
    RotateInner,
    /// Uncle black, node is the outer child: recolor and rotate at the
    /// grandparent; the walk terminates.
    RotateOuter,
}

fn insert_case(uncle_red: bool, inner_child: bool) -> InsertCase {
    if uncle_red {
        InsertCase::FlipColors
    } else if inner_child {
        InsertCase::RotateInner
    } else {
        InsertCase::RotateOuter
    }
}

/// One step of the erase fixup walk, classified from the sibling of the
/// deficient position and its children ("near" is the nephew on the
/// deficient side, "far" the other one).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum EraseCase {
    /// Sibling red: rotate it above the parent; the new sibling is black.
    SiblingRed,
    /// Sibling black with two black nephews: recolor the sibling red and
    /// move the deficiency up to the parent.
    NephewsBlack,
    /// Sibling black, far nephew black, near nephew red: rotate at the
    /// sibling to expose a red far nephew.
    NearNephewRed,
    /// Sibling black, far nephew red: recolor and rotate at the parent;
    /// the walk terminates.
    FarNephewRed,
}

fn erase_case(sibling_red: bool, near_red: bool, far_red: bool) -> EraseCase {
    if sibling_red {
        EraseCase::SiblingRed
    } else if !near_red && !far_red {
        EraseCase::NephewsBlack
    } else if !far_red {
        EraseCase::NearNephewRed
    } else {
        EraseCase::FarNephewRed
    }
}

/// A red-black tree of values keyed through a [`KeyOf`] projection and
/// ordered by a caller-supplied comparator.
///
/// This is the engine behind [`TreeMap`](crate::TreeMap) and
/// [`TreeSet`](crate::TreeSet). The node graph hangs off a heap-allocated
/// header sentinel whose `parent` caches the root and whose `left`/`right`
/// cache the minimum/maximum, so `begin`, last-element access and the
/// end-decrement all stay O(1).
///
/// The comparator is the sole source of ordering and equivalence: two keys
/// are equivalent iff neither compares less than the other. Keys never see
/// `==`.
pub struct RbTree<V, P, C>
where
    P: KeyOf<V>,
    C: Compare<P::Key>,
{
    header: NodePtr<V>,
    comp: C,
    node_count: usize,
    policy: PhantomData<P>,
}

impl<V, P, C> RbTree<V, P, C>
where
    P: KeyOf<V>,
    C: Compare<P::Key>,
{
    /// Creates an empty tree ordered by `comp`.
    pub fn new(comp: C) -> Self {
        let header = Box::into_raw(Box::new(Node {
            parent: ptr::null_mut(),
            left: ptr::null_mut(),
            right: ptr::null_mut(),
            // Red by construction: predecessor() recognizes the header by
            // its color together with the parent.parent loop.
            color: Color::Red,
            value: mem::MaybeUninit::uninit(),
        }));
        unsafe {
            (*header).left = header;
            (*header).right = header;
        }
        RbTree {
            header,
            comp,
            node_count: 0,
            policy: PhantomData,
        }
    }

    /// Number of elements in the tree.
    pub fn len(&self) -> usize {
        self.node_count
    }

    /// Returns true if the tree holds no elements.
    pub fn is_empty(&self) -> bool {
        self.node_count == 0
    }

    /// Upper bound on the number of elements the node allocator could ever
    /// satisfy.
    pub fn max_len(&self) -> usize {
        usize::MAX / mem::size_of::<Node<V>>()
    }

    /// Borrows the comparator.
    pub fn key_comp(&self) -> &C {
        &self.comp
    }

    fn root(&self) -> NodePtr<V> {
        unsafe { (*self.header).parent }
    }

    fn leftmost(&self) -> NodePtr<V> {
        unsafe { (*self.header).left }
    }

    fn rightmost(&self) -> NodePtr<V> {
        unsafe { (*self.header).right }
    }

    unsafe fn key<'a>(x: NodePtr<V>) -> &'a P::Key where V: 'a {
        P::key((*x).value.assume_init_ref())
    }

    /// In-order iterator over the whole tree.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter::new(self.leftmost(), self.header)
    }

    pub(super) fn iter_mut(&mut self) -> IterMut<'_, V> {
        IterMut::new(self.leftmost(), self.header)
    }

    /// Minimum element, if any.
    pub fn first(&self) -> Option<&V> {
        if self.node_count == 0 {
            None
        } else {
            unsafe { Some((*self.leftmost()).value.assume_init_ref()) }
        }
    }

    /// Maximum element, if any.
    pub fn last(&self) -> Option<&V> {
        if self.node_count == 0 {
            None
        } else {
            unsafe { Some((*self.rightmost()).value.assume_init_ref()) }
        }
    }

    // ==================== Search ====================

    /// First position whose key is not less than `k`; the header when no
    /// such position exists.
    pub(super) fn lower_bound_ptr<Q: ?Sized>(&self, k: &Q) -> NodePtr<V>
    where
        C: Compare<Q, P::Key>,
    {
        unsafe {
            let mut x = self.root();
            let mut y = self.header;
            while !x.is_null() {
                if self.comp.compares_le(k, Self::key(x)) {
                    y = x;
                    x = (*x).left;
                } else {
                    x = (*x).right;
                }
            }
            y
        }
    }

    /// First position whose key is greater than `k`; the header when no such
    /// position exists.
    pub(super) fn upper_bound_ptr<Q: ?Sized>(&self, k: &Q) -> NodePtr<V>
    where
        C: Compare<Q, P::Key>,
    {
        unsafe {
            let mut x = self.root();
            let mut y = self.header;
            while !x.is_null() {
                if self.comp.compares_lt(k, Self::key(x)) {
                    y = x;
                    x = (*x).left;
                } else {
                    x = (*x).right;
                }
            }
            y
        }
    }

    /// Position of the element equivalent to `k`, or the header.
    pub(super) fn find_ptr<Q: ?Sized>(&self, k: &Q) -> NodePtr<V>
    where
        C: Compare<Q, P::Key>,
    {
        let j = self.lower_bound_ptr(k);
        unsafe {
            if j == self.header || self.comp.compares_lt(k, Self::key(j)) {
                self.header
            } else {
                j
            }
        }
    }

    /// Iterator from the first element not less than `k` to the end.
    pub fn lower_bound<Q: ?Sized>(&self, k: &Q) -> Iter<'_, V>
    where
        C: Compare<Q, P::Key>,
    {
        Iter::new(self.lower_bound_ptr(k), self.header)
    }

    /// Iterator from the first element greater than `k` to the end.
    pub fn upper_bound<Q: ?Sized>(&self, k: &Q) -> Iter<'_, V>
    where
        C: Compare<Q, P::Key>,
    {
        Iter::new(self.upper_bound_ptr(k), self.header)
    }

    /// Iterator over every element equivalent to `k` (at most one under the
    /// unique-key policy).
    pub fn equal_range<Q: ?Sized>(&self, k: &Q) -> Iter<'_, V>
    where
        C: Compare<Q, P::Key>,
    {
        Iter::new(self.lower_bound_ptr(k), self.upper_bound_ptr(k))
    }

    /// Reference to the element equivalent to `k`, if present.
    pub fn find<Q: ?Sized>(&self, k: &Q) -> Option<&V>
    where
        C: Compare<Q, P::Key>,
    {
        let j = self.find_ptr(k);
        if j == self.header {
            None
        } else {
            unsafe { Some((*j).value.assume_init_ref()) }
        }
    }

    pub(super) fn find_mut<Q: ?Sized>(&mut self, k: &Q) -> Option<&mut V>
    where
        C: Compare<Q, P::Key>,
    {
        let j = self.find_ptr(k);
        if j == self.header {
            None
        } else {
            unsafe { Some((*j).value.assume_init_mut()) }
        }
    }

    /// Returns true if an element equivalent to `k` is present.
    pub fn contains<Q: ?Sized>(&self, k: &Q) -> bool
    where
        C: Compare<Q, P::Key>,
    {
        self.find_ptr(k) != self.header
    }

    /// Number of elements equivalent to `k` (0 or 1 under unique keys).
    pub fn count<Q: ?Sized>(&self, k: &Q) -> usize
    where
        C: Compare<Q, P::Key>,
    {
        self.equal_range(k).count()
    }

    // ==================== Insertion ====================

    /// Inserts `value` unless an equivalent key is already present.
    /// Returns whether the value was inserted.
    pub fn insert_unique(&mut self, value: V) -> bool {
        self.insert_pos(value).1.is_none()
    }

    /// Single-descent unique insert. Returns the position holding the key
    /// and, when an equivalent key was already present, hands the rejected
    /// value back untouched.
    pub(super) fn insert_pos(&mut self, value: V) -> (NodePtr<V>, Option<V>) {
        unsafe {
            let mut x = self.root();
            let mut y = self.header;
            let mut comp = true;
            {
                let k = P::key(&value);
                while !x.is_null() {
                    y = x;
                    comp = self.comp.compares_lt(k, Self::key(x));
                    x = if comp { (*x).left } else { (*x).right };
                }
            }
            // The descent ended left of y: the only candidate for an
            // equivalent key is y's predecessor.
            let mut j = y;
            if comp {
                if j == self.leftmost() {
                    return (self.insert_at(x, y, value), None);
                }
                j = predecessor(j);
            }
            if self.comp.compares_lt(Self::key(j), P::key(&value)) {
                return (self.insert_at(x, y, value), None);
            }
            (j, Some(value))
        }
    }

    /// Hint-validated insert: checks with one or two probes that the key
    /// belongs immediately adjacent to `pos` and links it there directly;
    /// otherwise falls back to the full-search insert. Observable results
    /// match [`insert_pos`](Self::insert_pos) for every key ordering.
    pub(super) fn insert_hint_pos(&mut self, pos: NodePtr<V>, value: V) -> (NodePtr<V>, Option<V>) {
        unsafe {
            if pos == self.header {
                // End hint: append after the maximum when the key is greater.
                if self.node_count > 0
                    && self.comp.compares_lt(Self::key(self.rightmost()), P::key(&value))
                {
                    let r = self.rightmost();
                    (self.insert_at(ptr::null_mut(), r, value), None)
                } else {
                    self.insert_pos(value)
                }
            } else if self.comp.compares_lt(P::key(&value), Self::key(pos)) {
                // Key sorts before the hint.
                if pos == self.leftmost() {
                    let l = self.leftmost();
                    (self.insert_at(l, l, value), None)
                } else {
                    let before = predecessor(pos);
                    if self.comp.compares_lt(Self::key(before), P::key(&value)) {
                        if (*before).right.is_null() {
                            (self.insert_at(ptr::null_mut(), before, value), None)
                        } else {
                            (self.insert_at(pos, pos, value), None)
                        }
                    } else {
                        self.insert_pos(value)
                    }
                }
            } else if self.comp.compares_lt(Self::key(pos), P::key(&value)) {
                // Key sorts after the hint.
                if pos == self.rightmost() {
                    let r = self.rightmost();
                    (self.insert_at(ptr::null_mut(), r, value), None)
                } else {
                    let after = successor(pos);
                    if self.comp.compares_lt(P::key(&value), Self::key(after)) {
                        if (*pos).right.is_null() {
                            (self.insert_at(ptr::null_mut(), pos, value), None)
                        } else {
                            (self.insert_at(after, after, value), None)
                        }
                    } else {
                        self.insert_pos(value)
                    }
                }
            } else {
                // Hint is equivalent to the key: nothing to insert.
                (pos, Some(value))
            }
        }
    }

    /// Hint insert with the end position; range construction funnels
    /// through here so pre-sorted input links in O(1) per element.
    pub(super) fn insert_hint_end(&mut self, value: V) -> (NodePtr<V>, Option<V>) {
        let end = self.header;
        self.insert_hint_pos(end, value)
    }

    /// Links a fresh node at the gap described by `(x, p)` and rebalances.
    /// `x` non-null forces a left insert below `p` (used by the hint paths).
    unsafe fn insert_at(&mut self, x: NodePtr<V>, p: NodePtr<V>, value: V) -> NodePtr<V> {
        let insert_left = !x.is_null()
            || p == self.header
            || self.comp.compares_lt(P::key(&value), Self::key(p));
        // The allocation happens before any link mutation: a failed
        // allocation leaves the tree exactly as it was.
        let node = Node::alloc(value);
        self.link_and_fix(insert_left, node, p);
        self.node_count += 1;
        node
    }

    unsafe fn link_and_fix(&mut self, insert_left: bool, x: NodePtr<V>, p: NodePtr<V>) {
        let header = self.header;
        (*x).parent = p;
        (*x).left = ptr::null_mut();
        (*x).right = ptr::null_mut();
        (*x).color = Color::Red;
        if insert_left {
            (*p).left = x;
            if p == header {
                (*header).parent = x;
                (*header).right = x;
            } else if p == (*header).left {
                (*header).left = x;
            }
        } else {
            (*p).right = x;
            if p == (*header).right {
                (*header).right = x;
            }
        }
        self.insert_fixup(x);
    }

    unsafe fn insert_fixup(&mut self, mut x: NodePtr<V>) {
        while x != self.root() && is_red((*x).parent) {
            let p = (*x).parent;
            let gp = (*p).parent;
            if p == (*gp).left {
                let uncle = (*gp).right;
                match insert_case(is_red(uncle), x == (*p).right) {
                    InsertCase::FlipColors => {
                        (*p).color = Color::Black;
                        (*uncle).color = Color::Black;
                        (*gp).color = Color::Red;
                        x = gp;
                    }
                    InsertCase::RotateInner => {
                        x = p;
                        self.rotate_left(x);
                        (*(*x).parent).color = Color::Black;
                        (*gp).color = Color::Red;
                        self.rotate_right(gp);
                    }
                    InsertCase::RotateOuter => {
                        (*p).color = Color::Black;
                        (*gp).color = Color::Red;
                        self.rotate_right(gp);
                    }
                }
            } else {
                let uncle = (*gp).left;
                match insert_case(is_red(uncle), x == (*p).left) {
                    InsertCase::FlipColors => {
                        (*p).color = Color::Black;
                        (*uncle).color = Color::Black;
                        (*gp).color = Color::Red;
                        x = gp;
                    }
                    InsertCase::RotateInner => {
                        x = p;
                        self.rotate_right(x);
                        (*(*x).parent).color = Color::Black;
                        (*gp).color = Color::Red;
                        self.rotate_left(gp);
                    }
                    InsertCase::RotateOuter => {
                        (*p).color = Color::Black;
                        (*gp).color = Color::Red;
                        self.rotate_left(gp);
                    }
                }
            }
        }
        (*self.root()).color = Color::Black;
    }

    unsafe fn rotate_left(&mut self, x: NodePtr<V>) {
        let y = (*x).right;
        (*x).right = (*y).left;
        if !(*y).left.is_null() {
            (*(*y).left).parent = x;
        }
        (*y).parent = (*x).parent;
        if x == (*self.header).parent {
            (*self.header).parent = y;
        } else if x == (*(*x).parent).left {
            (*(*x).parent).left = y;
        } else {
            (*(*x).parent).right = y;
        }
        (*y).left = x;
        (*x).parent = y;
    }

    unsafe fn rotate_right(&mut self, x: NodePtr<V>) {
        let y = (*x).left;
        (*x).left = (*y).right;
        if !(*y).right.is_null() {
            (*(*y).right).parent = x;
        }
        (*y).parent = (*x).parent;
        if x == (*self.header).parent {
            (*self.header).parent = y;
        } else if x == (*(*x).parent).left {
            (*(*x).parent).left = y;
        } else {
            (*(*x).parent).right = y;
        }
        (*y).right = x;
        (*x).parent = y;
    }

    // ==================== Deletion ====================

    /// Erases the element at `z`, dropping its value.
    pub(super) fn erase_ptr(&mut self, z: NodePtr<V>) {
        unsafe {
            let y = self.unlink(z);
            Node::dealloc(y);
        }
        self.node_count -= 1;
    }

    /// Erases the element at `z` and returns its value.
    pub(super) fn erase_take(&mut self, z: NodePtr<V>) -> V {
        unsafe {
            let y = self.unlink(z);
            let value = (*y).value.assume_init_read();
            Node::dealloc_empty(y);
            self.node_count -= 1;
            value
        }
    }

    /// Erases the element equivalent to `k` and hands its value back.
    pub(super) fn remove_value<Q: ?Sized>(&mut self, k: &Q) -> Option<V>
    where
        C: Compare<Q, P::Key>,
    {
        let j = self.find_ptr(k);
        if j == self.header {
            None
        } else {
            Some(self.erase_take(j))
        }
    }

    /// Erases every element equivalent to `k`; returns how many were
    /// removed (0 or 1 under unique keys).
    pub fn erase_key<Q: ?Sized>(&mut self, k: &Q) -> usize
    where
        C: Compare<Q, P::Key>,
    {
        let first = self.lower_bound_ptr(k);
        let last = self.upper_bound_ptr(k);
        let old_count = self.node_count;
        unsafe { self.erase_range_ptr(first, last) };
        old_count - self.node_count
    }

    /// Erases `[first, last)`. The whole-tree range degenerates to `clear`,
    /// O(1) teardown bookkeeping instead of per-element rebalancing.
    unsafe fn erase_range_ptr(&mut self, mut first: NodePtr<V>, last: NodePtr<V>) {
        if first == self.leftmost() && last == self.header {
            self.clear();
        } else {
            while first != last {
                let next = successor(first);
                self.erase_ptr(first);
                first = next;
            }
        }
    }

    /// Unlinks `z` from the tree and restores the balance invariants.
    /// Returns `z` itself, ready to be freed: a two-child target swaps
    /// structural position and color with its successor, so the successor
    /// node (and every iterator at it) stays live.
    unsafe fn unlink(&mut self, z: NodePtr<V>) -> NodePtr<V> {
        let header = self.header;
        let mut y = z;
        let mut x: NodePtr<V>;
        let mut x_parent: NodePtr<V>;

        if (*y).left.is_null() {
            x = (*y).right;
        } else if (*y).right.is_null() {
            x = (*y).left;
        } else {
            // Two children: unlink the successor's position instead.
            y = (*y).right;
            while !(*y).left.is_null() {
                y = (*y).left;
            }
            x = (*y).right;
        }

        if y != z {
            // Relink the successor into z's structural position.
            (*(*z).left).parent = y;
            (*y).left = (*z).left;
            if y != (*z).right {
                x_parent = (*y).parent;
                if !x.is_null() {
                    (*x).parent = (*y).parent;
                }
                (*(*y).parent).left = x;
                (*y).right = (*z).right;
                (*(*z).right).parent = y;
            } else {
                x_parent = y;
            }
            if (*header).parent == z {
                (*header).parent = y;
            } else if (*(*z).parent).left == z {
                (*(*z).parent).left = y;
            } else {
                (*(*z).parent).right = y;
            }
            (*y).parent = (*z).parent;
            mem::swap(&mut (*y).color, &mut (*z).color);
            y = z;
        } else {
            x_parent = (*y).parent;
            if !x.is_null() {
                (*x).parent = (*y).parent;
            }
            if (*header).parent == z {
                (*header).parent = x;
            } else if (*(*z).parent).left == z {
                (*(*z).parent).left = x;
            } else {
                (*(*z).parent).right = x;
            }
            // z had at most one child, so it may be the cached min or max.
            if (*header).left == z {
                (*header).left = if (*z).right.is_null() {
                    (*z).parent
                } else {
                    Node::minimum(x)
                };
            }
            if (*header).right == z {
                (*header).right = if (*z).left.is_null() {
                    (*z).parent
                } else {
                    Node::maximum(x)
                };
            }
        }

        if (*y).color != Color::Red {
            self.erase_fixup(x, x_parent);
        }
        y
    }

    unsafe fn erase_fixup(&mut self, mut x: NodePtr<V>, mut x_parent: NodePtr<V>) {
        while x != self.root() && is_black(x) {
            if x == (*x_parent).left {
                let w = (*x_parent).right;
                debug_assert!(!w.is_null(), "deficient position with no sibling");
                match erase_case(is_red(w), is_red((*w).left), is_red((*w).right)) {
                    EraseCase::SiblingRed => {
                        (*w).color = Color::Black;
                        (*x_parent).color = Color::Red;
                        self.rotate_left(x_parent);
                    }
                    EraseCase::NephewsBlack => {
                        (*w).color = Color::Red;
                        x = x_parent;
                        x_parent = (*x_parent).parent;
                    }
                    EraseCase::NearNephewRed => {
                        (*(*w).left).color = Color::Black;
                        (*w).color = Color::Red;
                        self.rotate_right(w);
                    }
                    EraseCase::FarNephewRed => {
                        (*w).color = (*x_parent).color;
                        (*x_parent).color = Color::Black;
                        if !(*w).right.is_null() {
                            (*(*w).right).color = Color::Black;
                        }
                        self.rotate_left(x_parent);
                        break;
                    }
                }
            } else {
                let w = (*x_parent).left;
                debug_assert!(!w.is_null(), "deficient position with no sibling");
                match erase_case(is_red(w), is_red((*w).right), is_red((*w).left)) {
                    EraseCase::SiblingRed => {
                        (*w).color = Color::Black;
                        (*x_parent).color = Color::Red;
                        self.rotate_right(x_parent);
                    }
                    EraseCase::NephewsBlack => {
                        (*w).color = Color::Red;
                        x = x_parent;
                        x_parent = (*x_parent).parent;
                    }
                    EraseCase::NearNephewRed => {
                        (*(*w).right).color = Color::Black;
                        (*w).color = Color::Red;
                        self.rotate_left(w);
                    }
                    EraseCase::FarNephewRed => {
                        (*w).color = (*x_parent).color;
                        (*x_parent).color = Color::Black;
                        if !(*w).left.is_null() {
                            (*(*w).left).color = Color::Black;
                        }
                        self.rotate_right(x_parent);
                        break;
                    }
                }
            }
        }
        if !x.is_null() {
            (*x).color = Color::Black;
        }
    }

    // ==================== Structural utilities ====================

    /// Removes every element and resets the header to the empty state.
    pub fn clear(&mut self) {
        unsafe {
            Self::delete_subtree(self.root());
            (*self.header).left = self.header;
            (*self.header).right = self.header;
            (*self.header).parent = ptr::null_mut();
        }
        self.node_count = 0;
    }

    // Recurse on right children, iterate down the left spine; depth stays
    // within the tree height.
    unsafe fn delete_subtree(mut x: NodePtr<V>) {
        while !x.is_null() {
            Self::delete_subtree((*x).right);
            let y = (*x).left;
            Node::dealloc(x);
            x = y;
        }
    }

    /// O(1) exchange of the two trees' contents. Each root's parent link is
    /// repointed at its new owner's header, which also serves as the end
    /// position, so neither tree's end identity changes.
    pub fn swap(&mut self, other: &mut Self) {
        unsafe {
            if self.root().is_null() {
                if !other.root().is_null() {
                    (*self.header).parent = (*other.header).parent;
                    (*self.header).left = (*other.header).left;
                    (*self.header).right = (*other.header).right;
                    (*(*self.header).parent).parent = self.header;
                    (*other.header).parent = ptr::null_mut();
                    (*other.header).left = other.header;
                    (*other.header).right = other.header;
                }
            } else if other.root().is_null() {
                (*other.header).parent = (*self.header).parent;
                (*other.header).left = (*self.header).left;
                (*other.header).right = (*self.header).right;
                (*(*other.header).parent).parent = other.header;
                (*self.header).parent = ptr::null_mut();
                (*self.header).left = self.header;
                (*self.header).right = self.header;
            } else {
                mem::swap(&mut (*self.header).parent, &mut (*other.header).parent);
                mem::swap(&mut (*self.header).left, &mut (*other.header).left);
                mem::swap(&mut (*self.header).right, &mut (*other.header).right);
                (*(*self.header).parent).parent = self.header;
                (*(*other.header).parent).parent = other.header;
            }
        }
        mem::swap(&mut self.node_count, &mut other.node_count);
        mem::swap(&mut self.comp, &mut other.comp);
    }

    // ==================== Consuming traversal ====================

    /// Unlinks and returns the minimum without rebalancing; only for
    /// consuming iteration, where balance no longer matters.
    pub(super) fn pop_min_unbalanced(&mut self) -> Option<V> {
        unsafe {
            let min = self.leftmost();
            if min == self.header {
                return None;
            }
            let r = (*min).right;
            let p = (*min).parent;
            if !r.is_null() {
                (*r).parent = p;
            }
            if p == self.header {
                (*self.header).parent = r;
            } else {
                (*p).left = r;
            }
            (*self.header).left = if !r.is_null() {
                Node::minimum(r)
            } else if p == self.header {
                self.header
            } else {
                p
            };
            if (*self.header).right == min {
                (*self.header).right = self.header;
            }
            self.node_count -= 1;
            let value = (*min).value.assume_init_read();
            Node::dealloc_empty(min);
            Some(value)
        }
    }

    /// Mirror of [`pop_min_unbalanced`](Self::pop_min_unbalanced).
    pub(super) fn pop_max_unbalanced(&mut self) -> Option<V> {
        unsafe {
            let max = self.rightmost();
            if max == self.header {
                return None;
            }
            let l = (*max).left;
            let p = (*max).parent;
            if !l.is_null() {
                (*l).parent = p;
            }
            if p == self.header {
                (*self.header).parent = l;
            } else {
                (*p).right = l;
            }
            (*self.header).right = if !l.is_null() {
                Node::maximum(l)
            } else if p == self.header {
                self.header
            } else {
                p
            };
            if (*self.header).left == max {
                (*self.header).left = self.header;
            }
            self.node_count -= 1;
            let value = (*max).value.assume_init_read();
            Node::dealloc_empty(max);
            Some(value)
        }
    }
}

impl<V, P, C> RbTree<V, P, C>
where
    V: Clone,
    P: KeyOf<V>,
    C: Compare<P::Key>,
{
    unsafe fn clone_node(src: NodePtr<V>) -> NodePtr<V> {
        let node = Node::alloc((*src).value.assume_init_ref().clone());
        (*node).color = (*src).color;
        node
    }

    // Deep copy preserving color and shape: recurse on right subtrees,
    // iterate down the left spine.
    unsafe fn copy_subtree(mut src: NodePtr<V>, parent: NodePtr<V>) -> NodePtr<V> {
        let top = Self::clone_node(src);
        (*top).parent = parent;
        if !(*src).right.is_null() {
            (*top).right = Self::copy_subtree((*src).right, top);
        }
        let mut parent = top;
        src = (*src).left;
        while !src.is_null() {
            let y = Self::clone_node(src);
            (*parent).left = y;
            (*y).parent = parent;
            if !(*src).right.is_null() {
                (*y).right = Self::copy_subtree((*src).right, y);
            }
            parent = y;
            src = (*src).left;
        }
        top
    }
}

impl<V, P, C> Clone for RbTree<V, P, C>
where
    V: Clone,
    P: KeyOf<V>,
    C: Compare<P::Key> + Clone,
{
    fn clone(&self) -> Self {
        let clone = RbTree::new(self.comp.clone());
        unsafe {
            if !self.root().is_null() {
                (*clone.header).parent = Self::copy_subtree(self.root(), clone.header);
                (*clone.header).left = Node::minimum((*clone.header).parent);
                (*clone.header).right = Node::maximum((*clone.header).parent);
            }
        }
        let mut clone = clone;
        clone.node_count = self.node_count;
        clone
    }
}

impl<V, P, C> Drop for RbTree<V, P, C>
where
    P: KeyOf<V>,
    C: Compare<P::Key>,
{
    fn drop(&mut self) {
        self.clear();
        unsafe {
            // The header's value slot was never initialized; free the box
            // without dropping a value.
            drop(Box::from_raw(self.header));
        }
    }
}

impl<V, P, C> IntoIterator for RbTree<V, P, C>
where
    P: KeyOf<V>,
    C: Compare<P::Key>,
{
    type Item = V;
    type IntoIter = IntoIter<V, P, C>;

    fn into_iter(self) -> IntoIter<V, P, C> {
        IntoIter { tree: self }
    }
}

#[cfg(test)]
impl<V, P, C> RbTree<V, P, C>
where
    P: KeyOf<V>,
    C: Compare<P::Key>,
{
    pub(super) fn root_is_black(&self) -> bool {
        self.root().is_null() || unsafe { (*self.root()).color == Color::Black }
    }

    /// Checks every structural invariant; returns an error message naming
    /// the first violation found.
    pub(super) fn check_invariants(&self) -> Result<(), String> {
        unsafe {
            let root = self.root();
            if root.is_null() {
                if self.node_count != 0 {
                    return Err(format!(
                        "empty root but node_count is {}",
                        self.node_count
                    ));
                }
                if self.leftmost() != self.header || self.rightmost() != self.header {
                    return Err("empty tree with stale min/max cache".to_string());
                }
                return Ok(());
            }
            if (*root).parent != self.header {
                return Err("root's parent does not point at the header".to_string());
            }
            if (*root).color != Color::Black {
                return Err("root is red".to_string());
            }
            let (_, count) = self.check_subtree(root)?;
            if count != self.node_count {
                return Err(format!(
                    "counted {} nodes but node_count is {}",
                    count, self.node_count
                ));
            }
            if self.leftmost() != Node::minimum(root) {
                return Err("min cache does not match the leftmost node".to_string());
            }
            if self.rightmost() != Node::maximum(root) {
                return Err("max cache does not match the rightmost node".to_string());
            }
            // In-order keys must be strictly increasing under the comparator.
            let mut node = self.leftmost();
            let mut prev: Option<NodePtr<V>> = None;
            while node != self.header {
                if let Some(p) = prev {
                    if !self.comp.compares_lt(Self::key(p), Self::key(node)) {
                        return Err("in-order keys are not strictly increasing".to_string());
                    }
                }
                prev = Some(node);
                node = successor(node);
            }
            Ok(())
        }
    }

    // Returns (black height, node count) of the subtree at `x`.
    unsafe fn check_subtree(&self, x: NodePtr<V>) -> Result<(usize, usize), String> {
        if x.is_null() {
            return Ok((1, 0));
        }
        if is_red(x) && (is_red((*x).left) || is_red((*x).right)) {
            return Err("red node with a red child".to_string());
        }
        if !(*x).left.is_null() && (*(*x).left).parent != x {
            return Err("left child with a broken parent link".to_string());
        }
        if !(*x).right.is_null() && (*(*x).right).parent != x {
            return Err("right child with a broken parent link".to_string());
        }
        let (lh, lc) = self.check_subtree((*x).left)?;
        let (rh, rc) = self.check_subtree((*x).right)?;
        if lh != rh {
            return Err(format!("black-height mismatch: left {} right {}", lh, rh));
        }
        let h = lh + usize::from((*x).color == Color::Black);
        Ok((h, lc + rc + 1))
    }
}
