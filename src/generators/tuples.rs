use crate::data::*;
use crate::generators::core::*;

// Component `i` is read from the left child of the `i`th node along the
// right spine, and shrinks with its siblings held.
macro_rules! tuple_generator_impl {
    ($gen_a:ident: $var_a:ident: $type_a:ident
        $(, $gen_n: ident: $var_n:ident: $type_n:ident)*) => (
        impl<$type_a: Generator, $($type_n: Generator),*> Generator
                for ($type_a, $($type_n),*) {
                    type Item = ($type_a::Item, $($type_n::Item),*);
                    #[allow(unused_assignments)]
                    fn generate(&self, tree: &ChoiceTree) -> Maybe<GenResult<Self::Item>> {
                        let &(ref $gen_a, $(ref $gen_n),*) = self;
                        let mut nodes = Vec::new();
                        let mut shrinks = Vec::new();
                        let mut node = tree.clone();

                        let $var_a = {
                            let res = $gen_a.generate(node.left())?;
                            shrinks.push(res.shrinks);
                            let next = node.right().clone();
                            nodes.push(node);
                            node = next;
                            res.value
                        };
                        $(let $var_n = {
                            let res = $gen_n.generate(node.left())?;
                            shrinks.push(res.shrinks);
                            let next = node.right().clone();
                            nodes.push(node);
                            node = next;
                            res.value
                        };)*

                        let spine = Spine::new(nodes);
                        Ok(GenResult::new(($var_a, $($var_n),*), spine.shrink_each_left(shrinks)))
                    }
                }
    );
}

tuple_generator_impl!(ga: a: A);
tuple_generator_impl!(ga: a: A, gb: b: B);
tuple_generator_impl!(ga: a: A, gb: b: B, gc: c: C);
tuple_generator_impl!(ga: a: A, gb: b: B, gc: c: C, gd: d: D);

tuple_generator_impl!(ga: a: A, gb: b: B, gc: c: C, gd: d: D, ge: e: E);
tuple_generator_impl!(ga: a: A, gb: b: B, gc: c: C, gd: d: D, ge: e: E, gf: f: F);
tuple_generator_impl!(
    ga: a: A,
    gb: b: B,
    gc: c: C,
    gd: d: D,
    ge: e: E,
    gf: f: F,
    gg: g: G
);
tuple_generator_impl!(
    ga: a: A,
    gb: b: B,
    gc: c: C,
    gd: d: D,
    ge: e: E,
    gf: f: F,
    gg: g: G,
    gh: h: H
);

tuple_generator_impl!(
    ga: a: A,
    gb: b: B,
    gc: c: C,
    gd: d: D,
    ge: e: E,
    gf: f: F,
    gg: g: G,
    gh: h: H,
    gi: i: I
);
tuple_generator_impl!(
    ga: a: A,
    gb: b: B,
    gc: c: C,
    gd: d: D,
    ge: e: E,
    gf: f: F,
    gg: g: G,
    gh: h: H,
    gi: i: I,
    gj: j: J
);
tuple_generator_impl!(
    ga: a: A,
    gb: b: B,
    gc: c: C,
    gd: d: D,
    ge: e: E,
    gf: f: F,
    gg: g: G,
    gh: h: H,
    gi: i: I,
    gj: j: J,
    gk: k: K
);
tuple_generator_impl!(
    ga: a: A,
    gb: b: B,
    gc: c: C,
    gd: d: D,
    ge: e: E,
    gf: f: F,
    gg: g: G,
    gh: h: H,
    gi: i: I,
    gj: j: J,
    gk: k: K,
    gl: l: L
);
