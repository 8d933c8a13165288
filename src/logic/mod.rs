crate::reexport!(datatype);
crate::reexport!(dialect);
