mod source_test;
