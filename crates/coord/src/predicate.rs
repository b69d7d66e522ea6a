//! Predicate combinators used to express poll termination conditions.

/// Predicate combinator for the ! operation.
pub fn not<A>(f: impl Fn(&A) -> bool) -> impl Fn(&A) -> bool {
    move |a| !f(a)
}

/// Predicate combinator for the && operation.
pub fn and<A>(f: impl Fn(&A) -> bool, g: impl Fn(&A) -> bool) -> impl Fn(&A) -> bool {
    move |a| f(a) && g(a)
}

/// Predicate combinator for the || operation.
pub fn or<A>(f: impl Fn(&A) -> bool, g: impl Fn(&A) -> bool) -> impl Fn(&A) -> bool {
    move |a| f(a) || g(a)
}

/// Contravariant functor map over predicates.
pub fn contramap<A, B>(f: impl Fn(&A) -> B, p: impl Fn(&B) -> bool) -> impl Fn(&A) -> bool {
    move |a| p(&f(a))
}

/// Curried version of the Eq::eq function that can be used to construct a predicate.
pub fn eq<A: PartialEq>(a: A) -> impl Fn(&A) -> bool {
    move |b| *b == a
}

/// Curried version of the Ord::ge function that can be used to construct a predicate.
pub fn ge<A: PartialOrd>(a: A) -> impl Fn(&A) -> bool {
    move |b| *b >= a
}

/// Curried version of the Ord::gt function that can be used to construct a predicate.
pub fn gt<A: PartialOrd>(a: A) -> impl Fn(&A) -> bool {
    move |b| *b > a
}
