use apollo_compiler::response::ResponseDataPathSegment;

/// Linked list of response path segments, stored on the stack of recursive
/// execution functions. `next` points to the parent level, so the list reads
/// leaf-to-root and must be reversed when materialized into an error path.
pub(crate) struct LinkedPathElement<'a> {
    pub(crate) element: ResponseDataPathSegment,
    pub(crate) next: LinkedPath<'a>,
}

/// `None` at the root of the response.
pub(crate) type LinkedPath<'a> = Option<&'a LinkedPathElement<'a>>;

pub(crate) fn path_to_vec(mut link: LinkedPath<'_>) -> Vec<ResponseDataPathSegment> {
    let mut path = Vec::new();
    while let Some(element) = link {
        path.push(element.element.clone());
        link = element.next;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use apollo_compiler::name;
    use apollo_compiler::response::ResponseDataPathSegment;

    use super::*;

    #[test]
    fn paths_materialize_root_first() {
        assert_eq!(path_to_vec(None), vec![]);
        let root = LinkedPathElement {
            element: ResponseDataPathSegment::Field(name!("user")),
            next: None,
        };
        let list = LinkedPathElement {
            element: ResponseDataPathSegment::ListIndex(3),
            next: Some(&root),
        };
        let leaf = LinkedPathElement {
            element: ResponseDataPathSegment::Field(name!("email")),
            next: Some(&list),
        };
        assert_eq!(
            path_to_vec(Some(&leaf)),
            vec![
                ResponseDataPathSegment::Field(name!("user")),
                ResponseDataPathSegment::ListIndex(3),
                ResponseDataPathSegment::Field(name!("email")),
            ]
        );
    }
}
