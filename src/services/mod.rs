pub(crate) mod question_gen;
