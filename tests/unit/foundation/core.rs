use super::*;

#[test]
fn size_rejects_zero_and_oversized() {
    assert!(Size::new(0, 4).is_err());
    assert!(Size::new(4, 0).is_err());
    assert!(Size::new(MAX_DIMENSION + 1, 1).is_err());
    let s = Size::new(3, 5).unwrap();
    assert_eq!(s.area(), 15);
    assert_eq!(s.bounds(), Rect::new(0, 0, 3, 5));
}

#[test]
fn rect_intersection_and_union() {
    let a = Rect::new(0, 0, 10, 10);
    let b = Rect::new(5, -5, 10, 10);
    assert_eq!(a.intersect(b), Some(Rect::new(5, 0, 5, 5)));
    assert_eq!(a.union(b), Rect::new(0, -5, 15, 15));

    let far = Rect::new(20, 20, 1, 1);
    assert_eq!(a.intersect(far), None);
    assert_eq!(a.union(Rect::default()), a);
}

#[test]
fn rect_edges_are_half_open() {
    let r = Rect::new(-2, 3, 4, 2);
    assert_eq!(r.right(), 2);
    assert_eq!(r.bottom(), 5);
    assert!(r.contains_point(-2, 3));
    assert!(!r.contains_point(2, 3));
    assert!(!r.contains_point(0, 5));
    assert_eq!(Rect::from_edges(1, 1, 1, 4), None);
}

#[test]
fn contains_rect_requires_full_coverage() {
    let outer = Rect::new(0, 0, 8, 8);
    assert!(outer.contains_rect(Rect::new(0, 0, 8, 8)));
    assert!(outer.contains_rect(Rect::new(2, 2, 1, 1)));
    assert!(!outer.contains_rect(Rect::new(7, 7, 2, 1)));
    assert!(!outer.contains_rect(Rect::new(1, 1, 0, 0)));
}

#[test]
fn zero_area_rects_never_intersect() {
    let a = Rect::new(0, 0, 10, 10);
    assert_eq!(a.intersect(Rect::new(3, 3, 0, 5)), None);
    assert!(Rect::new(3, 3, 0, 5).is_empty());
}
